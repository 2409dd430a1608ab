use std::future::Future;
use std::time::Duration;

use adoverlay::platform::{AdError, AdEvent, EventSink};
use adoverlay::sim::{EngineProbe, PlayerProbe, Response, SimAdEngine, SimBehavior, SimContentPlayer};
use adoverlay::{Outcome, Widget, WidgetConfig};
use anyhow::Context;
use clap::{Parser, ValueEnum};

/// Replay a scripted ad-session scenario against the in-memory collaborators
#[derive(Parser, Debug)]
#[command(name = "adoverlay", version, about)]
struct Args {
    /// Scenario to replay
    #[arg(long, value_enum, default_value_t = Scenario::Preroll)]
    scenario: Scenario,

    /// JSON widget configuration (defaults apply to missing fields)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Override the ad load timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Pre-roll plays, content resumes, ads complete
    Preroll,
    /// The ad server answers with an error
    RequestError,
    /// The session loads but fails to start
    StartError,
    /// The user dismisses the widget mid-ad
    Dismiss,
    /// The engine never answers (pair with --timeout-ms)
    Silent,
}

fn behavior(scenario: Scenario) -> SimBehavior {
    match scenario {
        Scenario::Preroll | Scenario::Dismiss => SimBehavior {
            response: Response::Load,
            ..Default::default()
        },
        Scenario::RequestError => SimBehavior {
            response: Response::Error(AdError::with_code(303, "No ads VAST response")),
            ..Default::default()
        },
        Scenario::StartError => SimBehavior {
            response: Response::Load,
            fail_start: true,
            ..Default::default()
        },
        Scenario::Silent => SimBehavior::default(),
    }
}

async fn script(scenario: Scenario, sink: EventSink, player: PlayerProbe, dismiss_delay: Duration) {
    player.user_play();
    tokio::time::sleep(Duration::from_millis(50)).await;

    match scenario {
        Scenario::Preroll => {
            sink.mute_clicked();
            sink.mute_clicked();
            sink.ad(AdEvent::ContentResumeRequested);
            sink.ad(AdEvent::AllAdsCompleted);
            player.finish();
        }
        Scenario::Dismiss => {}
        Scenario::RequestError | Scenario::StartError | Scenario::Silent => player.finish(),
    }

    // Dismiss once the button shows up so the loop returns
    tokio::time::sleep(dismiss_delay + Duration::from_millis(50)).await;
    sink.dismiss_clicked();
}

/// Run the widget while `script` feeds it; a failed script is an error even
/// though the widget itself shut down cleanly.
async fn drive<F>(widget: Widget, script: F) -> anyhow::Result<Outcome>
where
    F: Future<Output = ()> + Send + 'static,
{
    let driver = tokio::spawn(script);
    let outcome = widget.run().await;
    driver.await.context("scenario script")?;
    Ok(outcome)
}

fn print_calls(calls: &EngineProbe) {
    println!("engine calls:");
    for call in calls.calls() {
        println!("  {:?}", call);
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            WidgetConfig::from_json(&raw)?
        }
        None => WidgetConfig::default(),
    };
    if args.timeout_ms.is_some() {
        config.ad_load_timeout_ms = args.timeout_ms;
    }
    let dismiss_delay = Duration::from_millis(config.dismiss_delay_ms);
    let scenario = args.scenario;

    let player = SimContentPlayer::with_size(config.player_size);
    let player_probe = player.probe();
    let engine = SimAdEngine::with_behavior(behavior(scenario));
    let calls = engine.probe();

    let (widget, sink) = Widget::install(config, Box::new(player), Box::new(engine))?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    let outcome = rt.block_on(drive(widget, script(scenario, sink, player_probe, dismiss_delay)))?;

    println!("scenario: {:?}", scenario);
    println!("{:#?}", outcome);
    print_calls(&calls);
    Ok(())
}
