use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use liquidity_monitor::controller::Controller;
use liquidity_monitor::logging::{log, obj, v_str, Domain, Level};
use liquidity_monitor::model::Decision;
use liquidity_monitor::render::TextDashboard;
use liquidity_monitor::services::Endpoints;
use liquidity_monitor::state::{Config, Session};
use liquidity_monitor::transport::HttpTransport;
use serde_json::json;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  start | step [min] | reset          scenario control (each re-assesses)
  assess | force                      assess active cell (force asks the agent)
  portfolio                           refresh the entity x currency board
  live [ms] | play [ms] | pause       live refresh, playback, stop both
  stepsize <min>                      minutes per playback step
  select <n> | approve | reject       pick a ranked action and decide
  whatif <shock_pct> <delay_min>      chart overlay; `clear` resets it
  thresholds <warn> <breach>          severity horizons in minutes
  agent on|off                        auto-recommend on warnings
  entity <id> | currency <ccy>        change the active cell
  drivers <n>                         drivers shown per view
  endpoints <sim> <risk> <orch>       service base URLs
  quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Start,
    Step(Option<u32>),
    Reset,
    Assess,
    Force,
    Portfolio,
    Live(Option<Duration>),
    Play(Option<Duration>),
    StepSize(u32),
    Endpoints(Endpoints),
    Pause,
    Select(usize),
    Approve,
    Reject,
    WhatIf(f64, f64),
    Clear,
    Thresholds(i64, i64),
    Agent(bool),
    Entity(String),
    Currency(String),
    Drivers(usize),
    Help,
    Quit,
}

fn interval_arg(args: &[&str]) -> std::result::Result<Option<Duration>, String> {
    match args.first() {
        Some(ms) => match ms.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms))),
            _ => Err(format!("bad interval ms: {}", ms)),
        },
        None => Ok(None),
    }
}

fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();
    let num = |i: usize, what: &str| -> std::result::Result<f64, String> {
        args.get(i)
            .ok_or_else(|| format!("missing {}", what))?
            .parse::<f64>()
            .map_err(|_| format!("bad {}: {}", what, args[i]))
    };

    let cmd = match head.to_lowercase().as_str() {
        "start" => Command::Start,
        "step" => match args.first() {
            Some(m) => Command::Step(Some(m.parse().map_err(|_| format!("bad minutes: {}", m))?)),
            None => Command::Step(None),
        },
        "reset" => Command::Reset,
        "assess" => Command::Assess,
        "force" => Command::Force,
        "portfolio" => Command::Portfolio,
        "live" => Command::Live(interval_arg(&args)?),
        "play" => Command::Play(interval_arg(&args)?),
        "stepsize" => Command::StepSize(num(0, "step minutes")? as u32),
        "endpoints" => match args.as_slice() {
            [sim, risk, orch] => Command::Endpoints(Endpoints {
                simulator: sim.to_string(),
                risk: risk.to_string(),
                orchestrator: orch.to_string(),
            }),
            _ => return Err("usage: endpoints <sim_url> <risk_url> <orch_url>".to_string()),
        },
        "pause" => Command::Pause,
        "select" => Command::Select(num(0, "action number")? as usize),
        "approve" => Command::Approve,
        "reject" => Command::Reject,
        "whatif" => Command::WhatIf(num(0, "shock_pct")?, num(1, "delay_min")?),
        "clear" => Command::Clear,
        "thresholds" => Command::Thresholds(num(0, "warn")? as i64, num(1, "breach")? as i64),
        "agent" => match args.first().copied() {
            Some("on") => Command::Agent(true),
            Some("off") => Command::Agent(false),
            _ => return Err("usage: agent on|off".to_string()),
        },
        "entity" => Command::Entity(args.first().ok_or("missing entity id")?.to_string()),
        "currency" => Command::Currency(args.first().ok_or("missing currency")?.to_uppercase()),
        "drivers" => Command::Drivers(num(0, "driver count")? as usize),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(Some(cmd))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let controller = Controller::new(
        Arc::new(HttpTransport::new()),
        cfg.endpoints(),
        Session::from_config(&cfg),
        Arc::new(TextDashboard),
    );

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("scenario_id", v_str(&cfg.scenario_id)),
            ("entity_id", v_str(&cfg.entity_id)),
            ("currency", v_str(&cfg.currency)),
            ("endpoints", json!(controller.endpoints())),
        ]),
    );
    println!("{}", HELP);

    let mut live_interval = cfg.live_interval();
    let mut playback_interval = cfg.playback_interval();
    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        // Command failures are already rendered by the controller.
        match cmd {
            Command::Start => {
                let _ = controller.start_scenario().await;
            }
            Command::Step(minutes) => {
                let _ = controller.step(minutes).await;
            }
            Command::Reset => {
                let _ = controller.reset().await;
            }
            Command::Assess => {
                let _ = controller.assess(false).await;
            }
            Command::Force => {
                let _ = controller.assess(true).await;
            }
            Command::Portfolio => {
                controller.refresh_portfolio().await;
            }
            Command::Live(interval) => {
                live_interval = interval.unwrap_or(live_interval);
                controller.start_live(live_interval);
            }
            Command::Play(interval) => {
                playback_interval = interval.unwrap_or(playback_interval);
                controller.start_playback(playback_interval);
            }
            Command::StepSize(minutes) => controller.set_step_minutes(minutes),
            Command::Endpoints(endpoints) => controller.set_endpoints(endpoints),
            Command::Pause => controller.pause(),
            Command::Select(n) => match controller.select_rendered(n) {
                Some(action) => println!("selected {}", action.label()),
                None => println!("no action #{} on screen", n),
            },
            Command::Approve => {
                let _ = controller.decide(Decision::Approve).await;
            }
            Command::Reject => {
                let _ = controller.decide(Decision::Reject).await;
            }
            Command::WhatIf(shock, delay) => {
                controller.set_what_if(shock, delay);
                let _ = controller.assess(false).await;
            }
            Command::Clear => {
                controller.clear_what_if();
                let _ = controller.assess(false).await;
            }
            Command::Thresholds(warn, breach) => controller.set_thresholds(warn, breach),
            Command::Agent(on) => controller.set_auto_agent(on),
            Command::Entity(id) => controller.set_active(Some(id.as_str()), None),
            Command::Currency(ccy) => controller.set_active(None, Some(ccy.as_str())),
            Command::Drivers(n) => controller.set_driver_limit(n),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    controller.pause();
    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}
