//! Demonstration of the emosense aggregation pipeline.
//!
//! This example shows how to:
//! 1. Build a scripted sample source
//! 2. Start the aggregation scheduler
//! 3. Watch raw samples feed the chart and stable emotions trigger
//!    recommendations
//!
//! Run with: cargo run --example scripted_demo

use std::sync::Arc;
use std::time::Duration;

use emosense_agent::{
    chart::ConsoleChart,
    core::AggregationScheduler,
    detector::{EmotionLabel, ExpressionSample, ScriptedSource},
    recommend::PlaylistRecommender,
    VERSION,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    println!("Emosense Agent - Scripted Demo");
    println!("==============================");
    println!("Version: {VERSION}");
    println!();

    // A session that drifts from happy to sad, with a few no-face gaps.
    let mut script = Vec::new();
    for _ in 0..12 {
        script.push(Some(sample(EmotionLabel::Happy, 0.8)));
        script.push(Some(sample(EmotionLabel::Happy, 0.6)));
        script.push(Some(sample(EmotionLabel::Neutral, 0.5)));
        script.push(None);
        script.push(Some(sample(EmotionLabel::Sad, 0.7)));
    }

    let mut scheduler = AggregationScheduler::new(Duration::from_millis(200), 10)
        .with_chart(Arc::new(ConsoleChart::new(30)))
        .with_recommender(Arc::new(PlaylistRecommender));
    let stats = scheduler.stats();

    println!("Running for 10 seconds at a 200ms tick...");
    println!();

    scheduler
        .start(ScriptedSource::looping(script))
        .expect("Failed to start scheduler");

    tokio::time::sleep(Duration::from_secs(10)).await;

    println!();
    println!("Stopping...");
    scheduler.stop();
    scheduler.join().await;

    println!();
    println!("{}", stats.summary());
    println!();
    println!("Demo complete!");
}

fn sample(dominant: EmotionLabel, p: f64) -> ExpressionSample {
    let spread = (1.0 - p) / 3.0;
    ExpressionSample::new()
        .with(EmotionLabel::Neutral, spread)
        .with(EmotionLabel::Happy, spread)
        .with(EmotionLabel::Sad, spread)
        .with(EmotionLabel::Surprised, spread)
        .with(dominant, p)
}
