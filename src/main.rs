use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

mod cli;
mod client;
mod config;
mod errors;
mod links;
mod log;
mod prompt;
mod provider;
mod proxy;
mod response;
mod ux;
mod wire;
mod wizard;

use cli::{AskArgs, ClientArgs, Command, ServeArgs};
use client::{Controller, ProxyClient, Transport};
use config::Config;
use prompt::GenerationOptions;
use wizard::{Field, Step, WizardState};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = cli::Args::parse();
    log::init(args.debug);

    let cfg = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Serve(s) => serve(apply_serve_args(cfg, s)).await,
        Command::Wizard(c) => {
            let (cfg, opts) = apply_client_args(cfg, &c);
            let transport = ProxyClient::new(cfg.proxy_url.clone(), timeout(&cfg))?;
            run_wizard(&mut io::BufReader::new(io::stdin()), &transport, &opts).await
        }
        Command::Ask(a) => ask(cfg, a).await,
    }
}

fn timeout(cfg: &Config) -> Option<Duration> {
    cfg.timeout_secs.map(Duration::from_secs)
}

fn apply_serve_args(mut cfg: Config, s: ServeArgs) -> Config {
    if let Some(v) = s.bind {
        cfg.bind = v;
    }
    if let Some(v) = s.relay {
        cfg.relay = v;
    }
    if let Some(v) = s.model {
        cfg.model = v;
    }
    if let Some(v) = s.api_base {
        cfg.api_base = v;
    }
    cfg
}

fn apply_client_args(mut cfg: Config, c: &ClientArgs) -> (Config, GenerationOptions) {
    if let Some(v) = &c.proxy_url {
        cfg.proxy_url = v.clone();
    }
    if c.no_grounding {
        cfg.grounding = false;
    }
    if c.no_json_mode {
        cfg.expect_json = false;
    }
    let opts = GenerationOptions { expect_json: cfg.expect_json, grounding: cfg.grounding };
    (cfg, opts)
}

fn app_state(cfg: &Config, api_key: Option<String>) -> Result<proxy::AppState> {
    let provider = provider::GeminiProvider::new(cfg.model.clone(), cfg.api_base.clone(), timeout(cfg))?;
    Ok(proxy::AppState {
        provider: Arc::new(provider),
        api_key: api_key.map(Arc::from),
        relay: cfg.relay,
    })
}

async fn serve(cfg: Config) -> Result<()> {
    let api_key = config::api_key_from_env();
    if api_key.is_none() {
        tracing::warn!(
            vars = ?config::API_KEY_VARS,
            "no provider API key configured; every /recommend call will fail with 500"
        );
    }

    let app = proxy::router(app_state(&cfg, api_key)?);
    let listener = tokio::net::TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    tracing::info!(addr = %cfg.bind, model = %cfg.model, relay = ?cfg.relay, "proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires. If the listener cannot be installed it never resolves.
async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for ctrl-c; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Interactive loop. Returns as soon as `input` is exhausted.
async fn run_wizard<R, T>(input: &mut R, transport: &T, opts: &GenerationOptions) -> Result<()>
where
    R: BufRead,
    T: Transport + ?Sized,
{
    let mut c = Controller::default();

    loop {
        match c.step() {
            Step::Basics => {
                if ux::screen_basics(input, &mut c.state).is_none() {
                    return Ok(());
                }
                if let Err(e) = c.go_to_step(Step::Details) {
                    ux::alert(&e.to_string());
                }
            }
            Step::Details => {
                if ux::screen_details(input, &mut c.state).is_none() {
                    return Ok(());
                }
                let Some(choice) = ux::prompt_line(input, "Enter: 추천 받기 / b: 이전 단계 / q: 종료 >") else {
                    return Ok(());
                };
                match choice.as_str() {
                    "q" => return Ok(()),
                    "b" => {
                        let _ = c.go_to_step(Step::Basics);
                    }
                    _ => attempt(&mut c, transport, opts).await,
                }
            }
            // submit() always leaves Loading before returning
            Step::Loading => attempt(&mut c, transport, opts).await,
            Step::Results => {
                ux::show_results(c.results());
                let Some(choice) = ux::prompt_line(input, "r: 다시 추천 / e: 조건 수정 / 1: 처음으로 / q: 종료 >") else {
                    return Ok(());
                };
                match choice.as_str() {
                    "r" => attempt(&mut c, transport, opts).await,
                    "e" => {
                        let _ = c.go_to_step(Step::Details);
                    }
                    "1" => {
                        let _ = c.go_to_step(Step::Basics);
                    }
                    _ => return Ok(()),
                }
            }
        }
    }
}

async fn attempt<T: Transport + ?Sized>(c: &mut Controller, transport: &T, opts: &GenerationOptions) {
    let ticker = ux::Ticker::start();
    let result = c.submit(transport, opts).await.map(|_| ());
    ticker.stop();
    if let Err(e) = result {
        ux::alert(&e.alert_text());
    }
}

fn state_from_flags(a: &AskArgs) -> WizardState {
    let mut state = WizardState::default();
    state.select(Field::Relation, a.relation.clone());
    state.select(Field::Gender, a.gender.clone());
    state.select(Field::Occasion, a.occasion.clone());
    if let Some(age) = &a.age {
        state.select(Field::Age, age.clone());
    }
    if let Some(b) = a.budget {
        state.set_budget(b);
    }
    for i in &a.interests {
        state.toggle_interest(i);
    }
    state
}

async fn ask(cfg: Config, a: AskArgs) -> Result<()> {
    let (cfg, opts) = apply_client_args(cfg, &a.client);
    let mut c = Controller::new(state_from_flags(&a));

    c.go_to_step(Step::Details)?;

    if a.print_request {
        println!("{}", log::pretty(&prompt::build_request(&c.state, &opts))?);
        return Ok(());
    }

    let transport = ProxyClient::new(cfg.proxy_url.clone(), timeout(&cfg))?;
    tracing::debug!(url = transport.url(), "using proxy");

    let ticker = ux::Ticker::start();
    let result = c.submit(&transport, &opts).await.map(<[_]>::to_vec);
    ticker.stop();

    match result {
        Ok(items) => {
            ux::show_results(&items);
            Ok(())
        }
        Err(e) => {
            ux::alert(&e.alert_text());
            Err(e.into())
        }
    }
}
