use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::load_settings,
    presentation::{like_count_label, website_display},
    AuthUser, ContentLoader, ContentPage, DeletionOutcome, Navigator, PageContext,
    RedirectTarget, RestContentStore, Session, ToggleOutcome,
};
use shared::domain::{Collection, ContentId, ContentKind, UserId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Read and manage articles and events in the content store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one article or event.
    Show { collection: Collection, id: String },
    /// Like or unlike an article.
    Like {
        id: String,
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "articles")]
        collection: Collection,
    },
    /// Remove an item you wrote, then follow the redirect.
    Remove {
        collection: Collection,
        id: String,
        #[arg(long)]
        user: String,
    },
    /// List everything one author has written.
    ByAuthor { collection: Collection, author: String },
}

/// Prints the route a page would navigate to.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, target: RedirectTarget) {
        info!(route = target.route(), "navigating");
        println!("-> {}", target.route());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let settings = load_settings();
    let store = Arc::new(
        RestContentStore::from_settings(&settings).context("invalid store configuration")?,
    );
    let ctx = PageContext::from_settings(&settings, store.clone(), Arc::new(ConsoleNavigator));

    match cli.command {
        Command::Show { collection, id } => {
            let page = ContentPage::open(&ctx, collection, ContentId::new(id)).await;
            print_page(&page)?;
        }
        Command::Like {
            id,
            user,
            collection,
        } => {
            let session = Session::signed_in(AuthUser::new(user));
            let mut page = ContentPage::open(&ctx, collection, ContentId::new(id)).await;
            ensure_found(&page)?;
            match page.toggle_like(&session).await {
                Some(ToggleOutcome::Confirmed { likes }) => {
                    println!("{}", like_count_label(likes.len()));
                }
                Some(ToggleOutcome::RolledBack { error, .. }) => {
                    bail!("like was not saved: {error}");
                }
                None => print_status(&page),
            }
        }
        Command::Remove {
            collection,
            id,
            user,
        } => {
            let session = Session::signed_in(AuthUser::new(user));
            let mut page = ContentPage::open(&ctx, collection, ContentId::new(id)).await;
            ensure_found(&page)?;
            match page.remove(&session).await {
                Some(DeletionOutcome::Removed { redirect, delay }) => {
                    print_status(&page);
                    println!(
                        "redirecting to {} in {} ms",
                        redirect.route(),
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    while page.redirect_pending() {
                        tokio::task::yield_now().await;
                    }
                }
                Some(DeletionOutcome::Failed(error)) => bail!("remove failed: {error}"),
                Some(DeletionOutcome::AlreadyRemoved) | None => print_status(&page),
            }
            page.close();
        }
        Command::ByAuthor { collection, author } => {
            let loaded = ContentLoader::new(store)
                .load_by_author(collection, &UserId::new(author))
                .await;
            if let Some(error) = loaded.error {
                bail!("could not load {collection}: {error}");
            }
            for item in loaded.item.unwrap_or_default() {
                println!(
                    "{}\t{}\t{}",
                    item.id,
                    item.title,
                    like_count_label(item.likes.len())
                );
            }
        }
    }

    Ok(())
}

fn ensure_found(page: &ContentPage) -> Result<()> {
    if let Some(error) = page.load_error() {
        bail!("could not load {}: {error}", page.collection().noun());
    }
    if let Some(message) = page.missing_message() {
        bail!(message);
    }
    Ok(())
}

fn print_status(page: &ContentPage) {
    if let Some(status) = page.status().current() {
        println!("[{:?}] {}", status.kind, status.message);
    }
}

fn print_page(page: &ContentPage) -> Result<()> {
    ensure_found(page)?;
    let Some(item) = page.item() else {
        return Ok(());
    };

    println!("{}", item.title);
    println!(
        "by {} on {}",
        item.display_name,
        page.created_on().unwrap_or_default()
    );
    if let ContentKind::Event(details) = &item.kind {
        if let (Some(start), Some(end)) = (details.start_date, details.end_date) {
            println!("{start} - {end}");
        }
        if let Some(url) = &details.website_url {
            println!("{}", website_display(url));
        }
    }
    println!(
        "{} | {}",
        page.like_label().unwrap_or_default(),
        page.comment_label().unwrap_or_default()
    );
    if let Some(tags) = page.tags() {
        if !tags.visible().is_empty() {
            let mut line = tags.visible().join(", ");
            if let Some(more) = tags.affordance() {
                line.push_str(&format!(" ({more})"));
            }
            println!("tags: {line}");
        }
    }
    if let Some(body) = page.body() {
        println!();
        println!("{body}");
    }
    Ok(())
}
