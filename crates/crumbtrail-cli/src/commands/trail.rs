//! Session trail commands.

use anyhow::Context;
use crumbtrail_core::error::format_error_with_suggestion;
use crumbtrail_nav::{display_name, BreadcrumbsPlugin, Href, LinkBuilder};
use crumbtrail_session::{SqliteSessionStore, TRAIL_KEY};

use crate::{AppContext, Commands};

pub async fn handle(command: Commands, ctx: &AppContext) -> anyhow::Result<()> {
    let plugin = BreadcrumbsPlugin::from_config(&ctx.config)
        .map_err(|e| anyhow::anyhow!(format_error_with_suggestion(&e)))?;
    let db = SqliteSessionStore::new(&ctx.db_dir)
        .with_context(|| format!("Failed to open session database in {:?}", ctx.db_dir))?;

    match command {
        Commands::Visit { session, paths } => {
            let sid = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let handle = db.session(sid.as_str());
            println!("Session: {}", handle.sid());

            for path in &paths {
                if let Err(reason) = plugin.tracker().entry_for(path) {
                    println!("  skipped {} ({})", path, reason);
                }
                plugin.post_process_request(path, &handle).await;
            }

            print_trail(&plugin, &handle, &Href::new("")).await;
        }
        Commands::Show { session, base } => {
            let handle = db.session(session.as_str());
            print_trail(&plugin, &handle, &Href::new(base)).await;
        }
        Commands::Render {
            session,
            base,
            page,
        } => {
            let handle = db.session(session.as_str());
            let links = Href::new(base);

            match page {
                Some(path) => {
                    let html = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read page {:?}", path))?;
                    let mut stylesheets: Vec<String> = Vec::new();
                    let filtered = plugin.filter_page(&html, &handle, &links, &mut stylesheets).await;
                    for href in &stylesheets {
                        tracing::info!("Page requests stylesheet {}", href);
                    }
                    print!("{}", filtered);
                }
                None => {
                    let trail = plugin.crumbs(&handle).await;
                    match plugin.renderer().render(&trail, &links) {
                        Some(crumbs) => println!("{}", crumbs.to_html()),
                        None => eprintln!("No breadcrumbs for session {}", session),
                    }
                }
            }
        }
        Commands::Clear { session } => {
            let handle = db.session(session.as_str());
            plugin.clear(&handle).await?;
            println!("Cleared breadcrumbs for session {}", session);
        }
        Commands::List => {
            let sessions = db.sessions_with(TRAIL_KEY)?;
            if sessions.is_empty() {
                println!("No sessions with breadcrumbs.");
                return Ok(());
            }

            println!("{:<38} {:<20} {:<8} {}", "SESSION", "UPDATED", "BYTES", "CRUMBS");
            for summary in sessions {
                let trail = plugin.crumbs(&db.session(summary.sid.as_str())).await;
                println!(
                    "{:<38} {:<20} {:<8} {}",
                    summary.sid,
                    summary.updated_at.format("%Y-%m-%d %H:%M:%S"),
                    summary.byte_length,
                    trail.len()
                );
            }
        }
        Commands::Config { .. } => anyhow::bail!("config commands are not trail commands"),
    }

    Ok(())
}

async fn print_trail(
    plugin: &BreadcrumbsPlugin,
    session: &crumbtrail_session::SqliteSession,
    links: &Href,
) {
    let trail = plugin.crumbs(session).await;
    if trail.is_empty() {
        println!("  (no breadcrumbs)");
        return;
    }

    for (i, entry) in trail.iter().enumerate() {
        println!(
            "  {}. {:<24} {}",
            i + 1,
            display_name(entry),
            links.link(entry.realm(), entry.resource())
        );
    }
}
