use std::sync::Arc;
use std::time::Duration;

use api_types::auth::TokenPair;
use client::{ApiClient, EventBus, HttpAuthApi, MemoryTokenStore, RequestEpoch, Session, Topic};
use ledger::aggregate;
use reqwest::Url;
use tokio::sync::broadcast::error::RecvError;

use crate::config::AppConfig;
use crate::error::{AppError, Result};

pub struct App {
    config: AppConfig,
    client: ApiClient,
    bus: EventBus,
    epoch: RequestEpoch,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let auth = Arc::new(HttpAuthApi::new(base_url.clone()));
        let store = Arc::new(MemoryTokenStore::default());
        let session = Session::new(
            auth,
            store,
            TokenPair {
                access: config.access_token.clone(),
                refresh: config.refresh_token.clone(),
            },
        );
        let bus = EventBus::default();
        let client = ApiClient::new(base_url, session, bus.clone());
        Ok(Self {
            config,
            client,
            bus,
            epoch: RequestEpoch::new(),
        })
    }

    pub async fn run(&self) -> Result<()> {
        self.render_dashboard().await?;
        if !self.config.watch {
            return Ok(());
        }

        let mut signals = self.bus.subscribe();
        let mut poll = tokio::time::interval(Duration::from_secs(self.config.poll_seconds.max(1)));
        poll.tick().await;

        loop {
            tokio::select! {
                _ = poll.tick() => {}
                signal = signals.recv() => match signal {
                    Ok(Topic::Friends | Topic::Activity) => {}
                    Ok(_) => continue,
                    // A lagged receiver missed signals; refresh to catch up.
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
            self.render_dashboard().await?;
        }
    }

    async fn render_dashboard(&self) -> Result<()> {
        let ticket = self.epoch.begin();
        let views = self.client.list_expenses().await?;
        if !self.epoch.is_current(ticket) {
            tracing::debug!("dropping stale expense response");
            return Ok(());
        }

        let expenses: Vec<_> = views.iter().map(client::convert::expense).collect();
        let summary = aggregate(&expenses, &self.config.viewer_id);

        println!("Net balance: {}", summary.net_balance().format_usd(true));

        let friends = summary.sorted_friends();
        if friends.is_empty() {
            println!("All settled up.");
            return Ok(());
        }
        println!("\nFriends");
        for (friend_id, balance) in &friends {
            println!("  {friend_id}: {}", balance.format_usd(true));
        }

        println!("\nGroups");
        for group in summary.sorted_groups() {
            println!(
                "  {} ({} members): {}",
                group.label,
                group.member_count,
                group.amount.format_usd(true)
            );
        }
        Ok(())
    }
}

/// The URL must end with a slash or joined paths replace its last segment.
fn normalize_base_url(raw: &str) -> Result<Url> {
    let candidate = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&candidate).map_err(|err| AppError::BaseUrl(format!("{raw}: {err}")))
}
