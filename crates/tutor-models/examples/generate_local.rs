//! Run the local fallback models without the HTTP server.
//!
//! ```text
//! cargo run -p tutor-models --example generate_local -- "What is photosynthesis?"
//! ```

use tutor_config::Config;
use tutor_models::{
    InferencePool, IntentService, LanguageDetector, ModelFamily, ModelSpec, SamplingParams,
    Seq2SeqModel, TextGenerator, TranslationService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tutor_models=debug,info"))
        .init();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What is photosynthesis?".to_string());
    let config = Config::load()?;
    let pool = InferencePool::new(config.server.workers);

    let detected = LanguageDetector::new(&config.language).detect(&prompt);
    println!("Language: {} ({:.2})", detected.language, detected.confidence);

    let intents = IntentService::from_config(&config.models, config.sampling.max_input_tokens, pool.clone());
    let intent = intents.classify(&prompt).await?;
    println!("Intent:   {} ({:.2})", intent.intent, intent.confidence);

    let spec = ModelSpec::from_config(&config.models, ModelFamily::Generation);
    let params = SamplingParams::from_config(&config.sampling).with_budget(128, 0.7);
    let start = std::time::Instant::now();
    let answers = pool
        .run(move || {
            let model = Seq2SeqModel::load(&spec)?;
            model.generate(&format!("Answer the following question: {}", prompt), &params)
        })
        .await?;
    println!("\nGenerated in {:.2}s", start.elapsed().as_secs_f64());
    for (i, answer) in answers.iter().enumerate() {
        println!("  {}: {}", i + 1, answer);
    }

    if let Some(first) = answers.first() {
        let translator = TranslationService::from_config(&config.models, &config.sampling, pool);
        let hindi = translator.translate(first, "en", "hi").await?;
        println!("\nHindi: {}", hindi);
    }

    Ok(())
}
