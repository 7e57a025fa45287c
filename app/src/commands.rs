//! ABOUTME: CLI surface for the roster binary
//! ABOUTME: Maps each subcommand onto one repository call and renders JSON

use clap::{Args, Parser, Subcommand};
use rc_config::Config;
use rc_core::Result;
use rc_db::{ActivistExtra, ActivistJson, Db, DefaultStatusPolicy, RangeOptions, ASC_ORDER};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "rollcall", about = "Activist roster with attendance metrics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Every activist with attendance and membership data
    List,
    /// Identity fields only, ordered by name
    Roster,
    /// One activist by id or by name
    Show(ShowArgs),
    /// One keyset page ordered by name
    Range(RangeArgs),
    /// Look up an activist by name, creating a bare record if missing
    Ensure { name: String },
    /// Attendance aggregate for one activist
    Events {
        #[arg(long)]
        id: i64,
    },
    /// Overwrite an activist from a JSON record file
    Update {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ShowArgs {
    #[arg(long)]
    pub id: Option<i64>,
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Exclusive cursor name
    #[arg(long, default_value = "")]
    pub after: String,
    /// Page size; zero or less means unlimited
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
    /// 1 for ascending, 2 for descending
    #[arg(long, default_value_t = ASC_ORDER)]
    pub order: i64,
}

/// Run one subcommand and return its JSON output
pub async fn execute(command: &Command, db: &Db, config: &Config) -> Result<Value> {
    let policy = DefaultStatusPolicy::new(
        config.status.former_after_days,
        config.status.new_within_days,
        config.status.new_max_events,
    );
    let repo = db.activists().with_policy(Arc::new(policy));

    let output = match command {
        Command::List => serde_json::to_value(repo.get_all_json().await?)?,
        Command::Roster => serde_json::to_value(repo.list_basic().await?)?,
        Command::Show(ShowArgs { id: Some(id), .. }) => {
            serde_json::to_value(repo.get_json_by_id(*id).await?)?
        }
        Command::Show(ShowArgs { name, .. }) => {
            let name = name.as_deref().unwrap_or_default();
            serde_json::to_value(ActivistJson::from(repo.get_by_name(name).await?))?
        }
        Command::Range(args) => {
            let options = RangeOptions {
                name: args.after.clone(),
                limit: args.limit.unwrap_or(config.listing.default_limit),
                order: args.order,
            };
            serde_json::to_value(repo.list_range_json(&options).await?)?
        }
        Command::Ensure { name } => serde_json::to_value(repo.get_or_create(name).await?)?,
        Command::Events { id } => {
            let summary = repo.event_aggregate(*id).await?;
            json!({
                "id": id,
                "first_event": rc_core::format_event_date(summary.first_event),
                "last_event": rc_core::format_event_date(summary.last_event),
                "total_events": summary.total_events,
                "status": summary.status.to_string(),
            })
        }
        Command::Update { file } => {
            let raw = std::fs::read_to_string(file)?;
            let record = ActivistExtra::from(serde_json::from_str::<ActivistJson>(&raw)?);
            let id = repo.update_full(&record).await?;
            json!({ "id": id })
        }
    };

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{attend, memory_pool, seed_activist, seed_event};

    async fn setup() -> (Db, Config) {
        (Db::from_pool(memory_pool().await), Config::default())
    }

    #[test]
    fn test_cli_parses_range() {
        let cli = Cli::try_parse_from([
            "rollcall", "range", "--after", "Bob", "--limit", "-1", "--order", "2",
        ])
        .expect("range args should parse");

        match cli.command {
            Command::Range(args) => {
                assert_eq!(args.after, "Bob");
                assert_eq!(args.limit, Some(-1));
                assert_eq!(args.order, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_show_requires_id_or_name() {
        assert!(Cli::try_parse_from(["rollcall", "show"]).is_err());
        assert!(Cli::try_parse_from(["rollcall", "show", "--id", "1", "--name", "A"]).is_err());
    }

    #[tokio::test]
    async fn test_ensure_then_show_by_name() {
        let (db, config) = setup().await;

        let created = execute(
            &Command::Ensure {
                name: "Alice".into(),
            },
            &db,
            &config,
        )
        .await
        .unwrap();
        assert_eq!(created["name"], "Alice");

        let shown = execute(
            &Command::Show(ShowArgs {
                id: None,
                name: Some("Alice".into()),
            }),
            &db,
            &config,
        )
        .await
        .unwrap();
        assert_eq!(shown["id"], created["id"]);
        assert_eq!(shown["status"], "No attendance");
        assert_eq!(shown["first_event"], "");
    }

    #[tokio::test]
    async fn test_range_uses_configured_default_limit() {
        let (db, mut config) = setup().await;
        for name in ["Alice", "Bob", "Carol"] {
            seed_activist(db.pool(), name).await;
        }
        config.listing.default_limit = 2;

        let page = execute(
            &Command::Range(RangeArgs {
                after: String::new(),
                limit: None,
                order: ASC_ORDER,
            }),
            &db,
            &config,
        )
        .await
        .unwrap();

        let names: Vec<_> = page
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_range_rejects_bad_order() {
        let (db, config) = setup().await;

        let err = execute(
            &Command::Range(RangeArgs {
                after: String::new(),
                limit: Some(5),
                order: 0,
            }),
            &db,
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, rc_core::Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_events_reports_aggregate() {
        let (db, config) = setup().await;
        let id = seed_activist(db.pool(), "Alice").await;
        let event = seed_event(db.pool(), "2020-05-01").await;
        attend(db.pool(), id, event).await;

        let out = execute(&Command::Events { id }, &db, &config)
            .await
            .unwrap();
        assert_eq!(out["total_events"], 1);
        assert_eq!(out["first_event"], "2020-05-01");
        assert_eq!(out["last_event"], "2020-05-01");
    }

    #[tokio::test]
    async fn test_update_from_json_file() {
        let (db, config) = setup().await;
        let id = seed_activist(db.pool(), "Alice").await;

        let mut record = db.activists().get_json_by_id(id).await.unwrap();
        record.email = "alice@example.org".into();
        record.core_staff = 1;
        record.location = "Berkeley".into();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.json");
        std::fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

        let out = execute(&Command::Update { file: path }, &db, &config)
            .await
            .unwrap();
        assert_eq!(out["id"], id);

        let stored = db.activists().get_by_id(id).await.unwrap();
        assert_eq!(stored.activist.email, "alice@example.org");
        assert_eq!(stored.activist.location.as_deref(), Some("Berkeley"));
        assert!(stored.membership.core_staff);
    }

    #[tokio::test]
    async fn test_update_accepts_record_without_attendance() {
        let (db, config) = setup().await;
        let id = seed_activist(db.pool(), "Bob").await;
        let event = seed_event(db.pool(), "2020-05-01").await;
        attend(db.pool(), id, event).await;

        let record = json!({
            "id": id,
            "name": "Bob",
            "email": "bob@example.org",
            "chapter": "",
            "phone": "",
            "location": "",
            "facebook": "",
            "status": "",
            "core_staff": 0,
            "exclude_from_leaderboard": 0,
            "liberation_pledge": 1,
            "global_team_member": 0,
            "activist_level": "activist"
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bob.json");
        std::fs::write(&path, record.to_string()).unwrap();

        let out = execute(&Command::Update { file: path }, &db, &config)
            .await
            .unwrap();
        assert_eq!(out["id"], id);

        let stored = db.activists().get_by_id(id).await.unwrap();
        assert_eq!(stored.activist.email, "bob@example.org");
        assert!(stored.activist.liberation_pledge);
        assert_eq!(stored.attendance.total_events, 1);
    }
}
