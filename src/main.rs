use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use publish_menu::config::{self, Config};
use publish_menu::model::{ContentItem, PostStatus, SaveIntent};
use publish_menu::persistence::memory::{DeliveryStep, MemoryPersistence};
use publish_menu::schedule::to_site_time;
use publish_menu::text::Catalog;
use publish_menu::workflow::{ConfirmOutcome, PublishMenu, RetryOutcome, SaveOrigin, SaveOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file; the built-in example is used if it is missing
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Starting status of the demo item
    #[arg(long, default_value = "draft")]
    status: PostStatus,

    /// Action picked in the menu
    #[arg(long, default_value = "publish")]
    intent: SaveIntent,

    /// Send the item by email when it is published
    #[arg(long)]
    send_email: bool,

    /// Comma-separated delivery statuses handed out by successive reloads,
    /// e.g. `pending,pending,submitted` or `pending,failed:bounce`
    #[arg(long, value_delimiter = ',')]
    deliveries: Vec<DeliveryStep>,

    /// Retry the email delivery after the save
    #[arg(long)]
    retry: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    if args.config.exists() {
        return Ok(config::load(Some(&args.config))?);
    }
    info!(path=%args.config.display(), "config not found; using built-in example");
    let cfg: Config = serde_yaml::from_str(config::example())?;
    config::validate(&cfg)?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    let tz = cfg.site_timezone()?;

    let store = Arc::new(MemoryPersistence::from_config(&cfg)?);
    let mut item = ContentItem::draft("Weekly digest").with_status(args.status);
    if args.status != PostStatus::Draft || args.intent == SaveIntent::Schedule {
        let offset = match args.status {
            PostStatus::Published => -ChronoDuration::days(1),
            _ => ChronoDuration::days(1),
        };
        let at = Utc::now() + offset;
        item.published_at_utc = Some(at);
        item.published_at_blog_tz = Some(to_site_time(at, &tz));
    }
    store.insert(item.clone()).await;
    store.script_deliveries(args.deliveries.clone()).await;

    let menu = PublishMenu::new(
        item,
        store.clone(),
        Arc::new(Catalog::new(cfg.text.overrides.clone())),
        cfg.poll_settings(),
    );

    menu.open();
    menu.set_save_type(args.intent);
    menu.set_send_email_when_published(args.send_email);
    println!("trigger: {}", menu.trigger_text());
    println!("button:  {}", menu.button_text());

    match menu.save(SaveOrigin::Menu).await? {
        SaveOutcome::AwaitingConfirmation => {
            println!("confirming email send");
            match menu.confirm_email_send().await {
                Ok(ConfirmOutcome::Completed { delivery, .. }) => {
                    println!("delivery: {:?}", delivery);
                }
                Ok(ConfirmOutcome::AbortedByValidation) => {
                    return Err(anyhow!("save failed validation: {:?}", menu.item().errors));
                }
                Err(err) => error!(%err, "email send failed"),
            }
            menu.close_email_confirmation_modal().await;
        }
        SaveOutcome::Saved(_) => {
            menu.close(None).await;
        }
        other => {
            return Err(anyhow!("not saved: {:?} {:?}", other, menu.item().errors));
        }
    }
    if let Some(running) = menu.running_text() {
        println!("running: {}", running);
    }
    println!("success: {}", menu.success_text());

    if args.retry {
        match menu.retry_email_send().await {
            Ok(RetryOutcome::NoJob) => println!("retry: no email to retry"),
            Ok(RetryOutcome::NotRetried) => {
                println!("retry: refused {:?}", menu.item().errors)
            }
            Ok(RetryOutcome::Polled { delivery, .. }) => println!("retry: {:?}", delivery),
            Err(err) => error!(%err, "email retry failed"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&menu.item())?);
    Ok(())
}
