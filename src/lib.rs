//! arizona-status-bot

#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(
    doc,
    warn(
        rustdoc::bare_urls,
        rustdoc::broken_intra_doc_links,
        rustdoc::invalid_codeblock_attributes,
        rustdoc::invalid_rust_codeblocks,
        rustdoc::missing_crate_level_docs
    )
)]

pub mod batch;
pub mod roster;
pub mod samp;
pub mod status;

use std::{
    env,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use clap::Parser;
use dotenv::dotenv;
use palette::{LinSrgb, Mix};
use poise::{
    serenity_prelude::{self as serenity, ActivityData, Colour, CreateEmbed, CreateEmbedFooter},
    CreateReply, Framework, FrameworkOptions,
};
use rand::Rng;
use tokio::{sync::Mutex, time};
use tracing::{debug, error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    batch::{query_all_servers, StatusMap},
    roster::ARIZONA_SERVERS,
    samp::SampClient,
    status::{format_servers_status, group_thousands, StatusCache, StatusSummary},
};

struct Data {
    client: SampClient,
    cache: Arc<Mutex<StatusCache>>,
    cache_ttl: Duration,
}

/// Error type shared by bot commands.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

const EMBED_FOOTER: &str = concat!("arizona-status-bot ", env!("CARGO_PKG_VERSION"));

#[derive(Parser)]
struct Args {
    /// How long to wait for each server's reply.
    #[arg(short, long, env = "SAMP_QUERY_TIMEOUT", default_value = "2s", value_parser = humantime::parse_duration)]
    timeout: Duration,
    /// How long `/servers` reuses the previous batch.
    #[arg(long, env = "STATUS_CACHE_TTL", default_value = "5m", value_parser = humantime::parse_duration)]
    cache_ttl: Duration,
    #[arg(long, env = "ACTIVITY_UPDATE_INTERVAL", default_value = "60s", value_parser = humantime::parse_duration)]
    activity_interval: Duration,
    #[arg(short, long)]
    random_zero_messages: bool,
    /// Query every server once, print the summary and exit.
    #[arg(long)]
    print: bool,
}

/// Entry point for the bot.
pub async fn run_bot() -> Result<(), Error> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    let client = SampClient::new(args.timeout);
    info!(
        servers = ARIZONA_SERVERS.len(),
        timeout = %humantime::Duration::from(args.timeout),
        "using SAMP query roster"
    );

    if args.print {
        let results = query_all_servers(&client, ARIZONA_SERVERS).await;
        println!("{}", format_servers_status(ARIZONA_SERVERS, &results));
        return Ok(());
    }

    let token = match env::var("DISCORD_TOKEN") {
        Ok(token) => {
            info!(len = %token.len(), "successfully parsed token");
            token
        }
        Err(error) => {
            error!(%error, "failed to retrieve Discord token from env var");
            return Err(error.into());
        }
    };

    let intents = serenity::GatewayIntents::non_privileged();
    let cache = Arc::new(Mutex::new(StatusCache::default()));

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![register(), servers(), server()],
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("running setup callback");

                match poise::builtins::register_globally(ctx, &framework.options().commands).await {
                    Ok(_) => info!("registered commands globally"),
                    Err(error) => error!(%error, "failed to register commands"),
                }

                tokio::spawn(activity_loop(
                    ctx.clone(),
                    client,
                    Arc::clone(&cache),
                    args.activity_interval,
                    args.random_zero_messages,
                ));

                Ok(Data {
                    client,
                    cache,
                    cache_ttl: args.cache_ttl,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("running client...");
    client.start().await?;
    Ok(())
}

async fn activity_loop(
    ctx: serenity::Context,
    client: SampClient,
    cache: Arc<Mutex<StatusCache>>,
    interval: Duration,
    random_zero_messages: bool,
) {
    let zero_messages: [ActivityData; 4] = [
        ActivityData::watching("empty streets of Phoenix"),
        ActivityData::listening("the desert wind"),
        ActivityData::watching("tumbleweeds roll"),
        ActivityData::competing("a staring contest with nobody"),
    ];
    let mut last_players = None;

    loop {
        let results = query_all_servers(&client, ARIZONA_SERVERS).await;
        let summary = StatusSummary::new(ARIZONA_SERVERS, &results);
        cache.lock().await.store(results, Instant::now());

        match summary {
            StatusSummary { online: 0, .. } => {
                ctx.set_activity(Some(ActivityData::custom("Arizona RP servers are offline")));
                warn!(
                    next_update = %humantime::Duration::from(interval),
                    "no server answered"
                );
            }
            StatusSummary { total_players, .. } if last_players == Some(total_players) => {
                info!(
                    next_update = %humantime::Duration::from(interval),
                    "number of players has not changed; not updating activity data"
                );
            }
            StatusSummary { total_players: 0, .. } if random_zero_messages => {
                let idx = rand::thread_rng().gen_range(0..zero_messages.len());
                ctx.set_activity(Some(zero_messages[idx].clone()));
                info!(
                    players = 0,
                    next_update = %humantime::Duration::from(interval),
                    "set activity data to random zero-message"
                );
            }
            StatusSummary {
                total_players,
                online,
                servers,
                ..
            } => {
                let act = ActivityData::playing(format!(
                    "Arizona RP with {} players on {online}/{servers} servers",
                    group_thousands(total_players)
                ));
                ctx.set_activity(Some(act));
                info!(
                    players = %total_players,
                    next_update = %humantime::Duration::from(interval),
                    "updated activity data"
                );
            }
        }
        last_players = (summary.online > 0).then_some(summary.total_players);

        time::sleep(interval).await;
    }
}

/// Blends from dark purple (empty) to pink (full) by population.
fn population_colour(players: u32, max_players: u32) -> Colour {
    let (empty_r, empty_g, empty_b) = Colour::DARK_PURPLE.tuple();
    let (full_r, full_g, full_b) = Colour::FABLED_PINK.tuple();

    let load = if max_players == 0 {
        0.
    } else {
        (players as f32 / max_players as f32).min(1.)
    };

    let colour_result = LinSrgb::new(
        empty_r as f32 / 255.,
        empty_g as f32 / 255.,
        empty_b as f32 / 255.,
    )
    .mix(
        LinSrgb::new(
            full_r as f32 / 255.,
            full_g as f32 / 255.,
            full_b as f32 / 255.,
        ),
        load,
    );

    Colour::from_rgb(
        (colour_result.red * 255.) as u8,
        (colour_result.green * 255.) as u8,
        (colour_result.blue * 255.) as u8,
    )
}

fn status_embed(title: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .timestamp(Utc::now())
        .footer(CreateEmbedFooter::new(EMBED_FOOTER))
}

#[poise::command(prefix_command)]
#[tracing::instrument(name = "register_command", skip_all)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}

/// Show the population of every Arizona RP server.
#[poise::command(slash_command)]
#[tracing::instrument(name = "servers_command", skip_all)]
async fn servers(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let cached = data
        .cache
        .lock()
        .await
        .fresh(Instant::now(), data.cache_ttl)
        .cloned();

    let results: StatusMap = match cached {
        Some(results) => {
            debug!("using cached server status");
            results
        }
        None => {
            ctx.defer().await?;
            let results = query_all_servers(&data.client, ARIZONA_SERVERS).await;
            data.cache
                .lock()
                .await
                .store(results.clone(), Instant::now());
            results
        }
    };

    let summary = StatusSummary::new(ARIZONA_SERVERS, &results);
    let embed = status_embed("Arizona RP Servers")
        .description(format_servers_status(ARIZONA_SERVERS, &results))
        .colour(if summary.online == 0 {
            Colour::RED
        } else {
            population_colour(summary.total_players, summary.total_capacity)
        });

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show details for one Arizona RP server.
#[poise::command(slash_command)]
#[tracing::instrument(name = "server_command", skip(ctx))]
async fn server(
    ctx: Context<'_>,
    #[description = "Server number"] id: u8,
) -> Result<(), Error> {
    let Some(server) = roster::find(ARIZONA_SERVERS, id) else {
        ctx.say(format!(
            "There is no server {id}; pick one from 1 to {}.",
            ARIZONA_SERVERS.len()
        ))
        .await?;
        return Ok(());
    };

    ctx.defer().await?;
    let client = ctx.data().client;
    let (info, rules) = tokio::join!(
        client.query_server(server.host, server.port),
        client.query_rules(server.host, server.port)
    );
    debug!(?info, "got info");

    let title = format!("{}. {}", server.id, server.name);
    let embed = if info.is_online {
        let mut embed = status_embed(title)
            .colour(population_colour(info.players as u32, info.max_players as u32))
            .field("players", info.players.to_string(), true)
            .field("max players", info.max_players.to_string(), true)
            .field("address", format!("{}:{}", server.host, server.port), false);

        for (name, value) in [
            ("hostname", &info.hostname),
            ("gamemode", &info.gamemode),
            ("language", &info.language),
        ] {
            if !value.is_empty() {
                embed = embed.field(name, value, false);
            }
        }

        match rules {
            Ok(rules) => {
                if let Some(version) = rules.get("version") {
                    embed = embed.field("version", version, true);
                }
                if let Some(url) = rules.get("weburl") {
                    embed = embed.field("website", url, true);
                }
            }
            Err(error) => warn!(%error, "failed to retrieve server rules"),
        }
        embed
    } else {
        let reason = info.error.as_deref().unwrap_or("Server unavailable");
        warn!(error = %reason, "server is offline");
        status_embed(title)
            .description(format!(
                "The server doesn't appear to be running right now ({reason})."
            ))
            .colour(Colour::RED)
    };

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
