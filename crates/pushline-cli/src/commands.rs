//! Command handlers for the pushline CLI

use tracing::info;

use pushline_core::{ClassifiedIntent, MessageClassifier, RemoteMessage};

use crate::cli::Commands;
use crate::config::AppConfig;
use crate::error::Result;
use crate::scenario::{Scenario, ScenarioReport, ScenarioRunner};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(command: Commands, config: AppConfig) -> Result<()> {
        match command {
            Commands::Simulate { scenario, json } => {
                let scenario = Scenario::load_from_file(&scenario)?;
                let report = ScenarioRunner::new(config).run(&scenario).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    Self::print_report(&report);
                }
                Ok(())
            }
            Commands::Classify { message, mirror } => Self::handle_classify(&message, mirror),
            Commands::CheckConfig => Self::handle_check_config(&config),
            Commands::ExampleConfig => {
                println!("{}", AppConfig::example_config());
                Ok(())
            }
        }
    }

    fn handle_classify(message: &str, mirror: bool) -> Result<()> {
        let message: RemoteMessage = serde_json::from_str(message)?;
        let intent = if mirror {
            MessageClassifier::classify_mirrored(&message)
        } else {
            MessageClassifier::classify(&message)
        };

        match intent {
            ClassifiedIntent::AlreadyPresented => {
                println!("{}: already presented, nothing to render", message.message_id);
            }
            ClassifiedIntent::NeedsSynthesis(synthesis) => {
                println!(
                    "{}: needs synthesis: {:?} / {:?} ({} data keys)",
                    message.message_id,
                    synthesis.title,
                    synthesis.body,
                    synthesis.data.len()
                );
            }
        }
        Ok(())
    }

    fn handle_check_config(config: &AppConfig) -> Result<()> {
        config.validate()?;
        config
            .pipeline
            .provider
            .validate()
            .map_err(pushline_core::PipelineError::from)?;

        info!(
            project = %config.pipeline.provider.project_id,
            channel = %config.pipeline.notification_channel.id,
            "Configuration is valid"
        );
        println!("Configuration OK");
        Ok(())
    }

    fn print_report(report: &ScenarioReport) {
        println!("Scenario: {}", report.name);
        println!("Presented notifications: {}", report.presented.len());
        for shown in &report.presented {
            println!("  [{}] {} | {}", shown.channel_id, shown.title, shown.body);
        }
        println!("Routed intents: {}", report.intents.len());
        for intent in &report.intents {
            println!(
                "  {:?} -> {}",
                intent.source,
                intent.route.as_deref().unwrap_or("<open app>")
            );
        }
        for granted in &report.permission_results {
            println!("Permission granted: {}", granted);
        }
        for token in &report.tokens {
            println!("Token: {}", token.as_deref().unwrap_or("<none>"));
        }
        let handler = &report.stats.handler;
        println!(
            "Handler: received {}, presented {}, not presented {}, duplicates {}, failed {}",
            handler.received,
            handler.presented,
            handler.not_presented,
            handler.duplicates,
            handler.failed
        );
        println!(
            "Dedup: {} ids seen, duplicate rate {:.2}",
            handler.ledger.messages_seen,
            handler.ledger.duplicate_rate()
        );
        if report.stats.messaging_disabled {
            println!("Messaging: disabled");
        }
    }
}
