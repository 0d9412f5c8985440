//! Rapport - relationship memory and suggestion quality gating
//!
//! Command-line entry point for running private inputs through the
//! coaching pipeline and for inspecting the quality gate.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rapport::{
    config::RapportConfig,
    memory::{InteractionSource, IntakeInput, RelationshipType},
    quality::QualityValidator,
    suggestion::{
        FeedbackRecord, InMemorySuggestionSink, JsonlSuggestionSink, RecipientProfile,
        SuggestionCandidate, SuggestionCategory, SuggestionSink,
    },
    CoachingPipelineBuilder, CoachingRequest,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rapport")]
#[command(author = "Rapport Team")]
#[command(version)]
#[command(about = "Relationship memory and suggestion quality gating")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RAPPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one private input through the full coaching pipeline
    Coach {
        /// Owning user ID
        #[arg(long, default_value = "local-user")]
        user: String,

        /// Relationship ID
        #[arg(short, long)]
        relationship: String,

        /// Relationship type (romantic, work, family, friend, other)
        #[arg(short = 't', long, default_value = "romantic")]
        relationship_type: String,

        /// Private text (journal entry, check-in answer, ...)
        #[arg(short, long)]
        text: String,

        /// Recipient ID
        #[arg(long, default_value = "recipient")]
        recipient: String,

        /// Recipient's preferred categories, most preferred first
        #[arg(long = "prefer", value_delimiter = ',')]
        preferences: Vec<String>,

        /// Append accepted suggestions to this JSON-lines file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Score one candidate suggestion against a source text
    Validate {
        /// Candidate category
        #[arg(long, default_value = "other")]
        category: String,

        /// Candidate suggestion text
        #[arg(long)]
        candidate: String,

        /// Anonymized context shown with the candidate
        #[arg(long, default_value = "")]
        context: String,

        /// Source private text
        #[arg(long, default_value = "")]
        source: String,

        /// Recipient's preferred categories, most preferred first
        #[arg(long = "prefer", value_delimiter = ',')]
        preferences: Vec<String>,

        /// Historical feedback as category:rating pairs
        #[arg(long, value_delimiter = ',')]
        feedback: Vec<String>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rapport={}", log_level).into());
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load configuration
    let config = match cli.config {
        Some(ref path) => RapportConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RapportConfig::default(),
    };

    match cli.command {
        Commands::Coach {
            user,
            relationship,
            relationship_type,
            text,
            recipient,
            preferences,
            output,
        } => {
            let request = CoachingRequest {
                input: IntakeInput {
                    owner_user_id: user,
                    relationship_id: relationship,
                    relationship_type: relationship_type.parse::<RelationshipType>()?,
                    text,
                    source: InteractionSource::Journal,
                },
                recipient: profile(recipient, &preferences)?,
                feedback: Vec::new(),
                base_instruction: None,
            };
            run_coach(config, request, output).await?;
        }
        Commands::Validate {
            category,
            candidate,
            context,
            source,
            preferences,
            feedback,
        } => {
            let candidate =
                SuggestionCandidate::new(category.parse::<SuggestionCategory>()?, candidate, context);
            let profile = profile("recipient".to_string(), &preferences)?;
            let feedback = parse_feedback(&feedback)?;
            run_validate(&config, &candidate, &source, &profile, &feedback)?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_coach(
    config: RapportConfig,
    request: CoachingRequest,
    output: Option<PathBuf>,
) -> Result<()> {
    let sink: Arc<dyn SuggestionSink> = match output {
        Some(path) => Arc::new(JsonlSuggestionSink::new(path)),
        None => Arc::new(InMemorySuggestionSink::new()),
    };

    let pipeline = CoachingPipelineBuilder::new()
        .config(config)
        .sink(sink)
        .build()?;

    let report = pipeline.process(&request).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_validate(
    config: &RapportConfig,
    candidate: &SuggestionCandidate,
    source: &str,
    profile: &RecipientProfile,
    feedback: &[FeedbackRecord],
) -> Result<()> {
    let validator = QualityValidator::new(&config.quality)?;
    let result = validator.validate(candidate, source, profile, feedback);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn show_config(config: Option<&RapportConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}

fn profile(recipient_id: String, preferences: &[String]) -> Result<RecipientProfile> {
    let mut profile = RecipientProfile::new(recipient_id);
    for preference in preferences {
        profile = profile.prefer(preference.parse::<SuggestionCategory>()?);
    }
    Ok(profile)
}

fn parse_feedback(pairs: &[String]) -> Result<Vec<FeedbackRecord>> {
    pairs
        .iter()
        .map(|pair| -> Result<FeedbackRecord> {
            let (category, rating) = pair
                .split_once(':')
                .with_context(|| format!("Feedback '{}' is not category:rating", pair))?;
            let rating: u8 = rating
                .parse()
                .with_context(|| format!("Invalid rating in '{}'", pair))?;
            Ok(FeedbackRecord::new(category.parse::<SuggestionCategory>()?, rating)?)
        })
        .collect()
}
