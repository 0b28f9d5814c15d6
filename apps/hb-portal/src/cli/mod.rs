//! # HB Portal CLI Module
//!
//! This module implements the CLI interface for the HB Portal.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database, optionally with demo data
//! - `status` - Show record counts
//! - `trainees`, `register` - Roster
//! - `missions`, `complete`, `approve`, `pending` - Missions and tasks
//! - `progress`, `home`, `badges` - Trainee views
//! - `mission-add`, `task-add` - Catalog administration
//! - `support-submit`, `support-list`, `support-status` - Support queue
//! - `announce`, `announcements` - Notices by audience
//! - `export`, `import` - Snapshots
//! - `compact` - Reclaim space in a redb database

mod commands;

use crate::config::PortalConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hb_portal_core::{Audience, PortalError, Stage, SupportCategory, SupportStatus};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// HB Portal - trainee progression for the HB training programme
///
/// Tracks missions, tasks, XP levels, badges and support requests.
#[derive(Parser, Debug)]
#[command(name = "hb-portal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: hb-portal.toml if present)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the portal database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "file" (snapshot file) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (default from config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,

        /// Install the demo trainees, missions and badges
        #[arg(long)]
        seed: bool,
    },

    /// Show record counts
    Status,

    /// List trainees
    Trainees,

    /// Register a trainee
    Register {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Cohort label
        #[arg(short, long)]
        cohort: Option<String>,

        /// Journey stage ("Orientation", "skills_training", ...)
        #[arg(short, long, default_value = "orientation")]
        stage: Stage,
    },

    /// Show the mission board for a trainee
    Missions {
        #[arg(short, long)]
        trainee: String,
    },

    /// Mark a task done for a trainee
    Complete {
        #[arg(short, long)]
        trainee: String,

        #[arg(short = 'k', long)]
        task: String,
    },

    /// Approve a task for a trainee
    Approve {
        #[arg(short, long)]
        trainee: String,

        #[arg(short = 'k', long)]
        task: String,

        /// Name recorded as approver
        #[arg(short, long, default_value = "admin")]
        approver: String,
    },

    /// List tasks awaiting approval for a trainee
    Pending {
        #[arg(short, long)]
        trainee: String,
    },

    /// Show levels, track progress and badges for a trainee
    Progress {
        #[arg(short, long)]
        trainee: String,
    },

    /// Show the home summary for a trainee
    Home {
        #[arg(short, long)]
        trainee: String,
    },

    /// List the badge catalog
    Badges,

    /// Create a mission
    MissionAdd {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Stage the mission is open to (all stages when omitted)
        #[arg(short, long)]
        stage: Option<Stage>,

        /// First active day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last active day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Headline XP shown on the mission card
        #[arg(short, long, default_value = "0")]
        xp: u64,
    },

    /// Add a task to a mission
    TaskAdd {
        #[arg(short, long)]
        mission: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Track: kitchen, stall_ops or life_mindset
        #[arg(short = 'r', long)]
        track: String,

        /// XP reward (10 to 300)
        #[arg(short, long)]
        xp: u64,

        /// Require an approver before XP is credited
        #[arg(long)]
        requires_approval: bool,
    },

    /// File a support request
    SupportSubmit {
        #[arg(short, long)]
        trainee: String,

        #[arg(short, long)]
        message: String,

        /// training, placement, personal_support or other
        #[arg(short, long, default_value = "other")]
        category: SupportCategory,
    },

    /// List support requests, newest first
    SupportList,

    /// Change the status of a support request
    SupportStatus {
        /// Support request id
        #[arg(short, long)]
        id: String,

        /// new, in_progress or handled
        #[arg(short, long)]
        status: SupportStatus,
    },

    /// Publish an announcement
    Announce {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        body: String,

        /// all, trainees, mentors or employers
        #[arg(short, long, default_value = "all")]
        audience: Audience,
    },

    /// List announcements, newest first
    Announcements {
        /// Show only what this audience sees (everything when omitted)
        #[arg(short, long)]
        audience: Option<Audience>,
    },

    /// Export every collection to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (snapshot, json)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Merge a snapshot or JSON export into the database
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compact a redb database file
    Compact,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), PortalError> {
    let config = PortalConfig::load(cli.config.as_deref())?;
    let db_path = cli.database.unwrap_or_else(|| config.database.clone());
    let backend = cli.backend.unwrap_or_else(|| config.backend.clone());
    validate_backend(&backend)?;

    let backend = backend.as_str();
    let json_mode = cli.json_mode;

    tracing::debug!(
        database = ?db_path,
        backend,
        environment = %config.environment,
        "Resolved settings"
    );

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&db_path, backend, &config, host, port).await
        }
        Some(Commands::Init { force, seed }) => cmd_init(&db_path, backend, force, seed),
        Some(Commands::Status) => cmd_status(&db_path, backend, json_mode),
        Some(Commands::Trainees) => cmd_trainees(&db_path, backend, json_mode),
        Some(Commands::Register {
            name,
            cohort,
            stage,
        }) => cmd_register(&db_path, backend, json_mode, &name, cohort.as_deref(), stage),
        Some(Commands::Missions { trainee }) => {
            cmd_missions(&db_path, backend, json_mode, &trainee)
        }
        Some(Commands::Complete { trainee, task }) => {
            cmd_complete(&db_path, backend, json_mode, &trainee, &task)
        }
        Some(Commands::Approve {
            trainee,
            task,
            approver,
        }) => cmd_approve(&db_path, backend, json_mode, &trainee, &task, &approver),
        Some(Commands::Pending { trainee }) => cmd_pending(&db_path, backend, json_mode, &trainee),
        Some(Commands::Progress { trainee }) => {
            cmd_progress(&db_path, backend, json_mode, &trainee)
        }
        Some(Commands::Home { trainee }) => cmd_home(&db_path, backend, json_mode, &trainee),
        Some(Commands::Badges) => cmd_badges(&db_path, backend, json_mode),
        Some(Commands::MissionAdd {
            title,
            description,
            stage,
            from,
            to,
            xp,
        }) => cmd_mission_add(
            &db_path,
            backend,
            json_mode,
            hb_portal_core::NewMission {
                title,
                description,
                stage,
                active_from: from,
                active_to: to,
                total_xp_reward: xp,
            },
        ),
        Some(Commands::TaskAdd {
            mission,
            title,
            description,
            track,
            xp,
            requires_approval,
        }) => cmd_task_add(
            &db_path,
            backend,
            json_mode,
            hb_portal_core::NewTask {
                mission_id: hb_portal_core::MissionId::new(mission),
                title,
                description,
                track: hb_portal_core::Track::from(track),
                xp_reward: xp,
                auto_complete: !requires_approval,
            },
        ),
        Some(Commands::SupportSubmit {
            trainee,
            message,
            category,
        }) => cmd_support_submit(&db_path, backend, json_mode, &trainee, &message, category),
        Some(Commands::SupportList) => cmd_support_list(&db_path, backend, json_mode),
        Some(Commands::SupportStatus { id, status }) => {
            cmd_support_status(&db_path, backend, json_mode, &id, status)
        }
        Some(Commands::Export { output, format }) => {
            cmd_export(&db_path, backend, &output, &format)
        }
        Some(Commands::Announce {
            title,
            body,
            audience,
        }) => cmd_announce(&db_path, backend, json_mode, &title, &body, audience),
        Some(Commands::Announcements { audience }) => {
            cmd_announcements(&db_path, backend, json_mode, audience)
        }
        Some(Commands::Import { input }) => cmd_import(&db_path, backend, json_mode, &input),
        Some(Commands::Compact) => cmd_compact(&db_path, backend, json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(&db_path, backend, json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hb-portal",
            "complete",
            "--trainee",
            "trainee-1",
            "--task",
            "task-1",
            "-B",
            "file",
            "--json-mode",
        ])
        .expect("parse");
        assert_eq!(cli.backend.as_deref(), Some("file"));
        assert!(cli.json_mode);
        assert!(matches!(cli.command, Some(Commands::Complete { .. })));
    }

    #[test]
    fn parses_stage_and_dates() {
        let cli = Cli::try_parse_from([
            "hb-portal",
            "mission-add",
            "--title",
            "Night Market Shift",
            "--stage",
            "Stall Practice",
            "--from",
            "2026-03-01",
            "--to",
            "2026-03-31",
        ])
        .expect("parse");
        match cli.command {
            Some(Commands::MissionAdd {
                stage, from, to, ..
            }) => {
                assert_eq!(stage, Some(Stage::StallPractice));
                assert_eq!(from, NaiveDate::from_ymd_opt(2026, 3, 1));
                assert_eq!(to, NaiveDate::from_ymd_opt(2026, 3, 31));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_announcement_audience() {
        let cli = Cli::try_parse_from([
            "hb-portal",
            "announce",
            "--title",
            "Mentor sync",
            "--body",
            "Friday 9am",
            "--audience",
            "MENTORS",
        ])
        .expect("parse");
        match cli.command {
            Some(Commands::Announce { audience, .. }) => assert_eq!(audience, Audience::Mentors),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["hb-portal", "compact", "-B", "redb"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Compact)));
    }

    #[test]
    fn rejects_unknown_support_status() {
        let result = Cli::try_parse_from([
            "hb-portal",
            "support-status",
            "--id",
            "support-1",
            "--status",
            "closed",
        ]);
        assert!(result.is_err());
    }
}
