//! Mock FRM web server
//!
//! Serves simulated `/getTrains`, `/getVehicles` and `/getProdStats` JSON so the
//! exporter can be run without the game.
//!
//! Behavior (all derived from seconds since start):
//! 1. "Freight 1" cycles Iron Mine -> Smelter -> Port, one stop per segment
//! 2. "Express 2" shuttles North Yard <-> South Yard at half the pace
//! 3. "Shunter" is driven manually and never gets timed
//! 4. "Truck 1" waits at its depot, then drives a circular loop back to it
//! 5. Production numbers drift slowly
//!
//! Usage:
//!   cargo run --bin mock_frm -- --port 8080 --segment-secs 30 --loop-secs 90

use bytes::Bytes;
use clap::Parser;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// Fraction of the vehicle loop spent parked at the depot
const DEPOT_DWELL: f64 = 0.15;
/// Radius of the vehicle loop (world units)
const LOOP_RADIUS: f64 = 20_000.0;

#[derive(Parser, Debug)]
#[command(name = "mock_frm")]
#[command(about = "Mock Ficsit Remote Monitoring server for local simulation")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Seconds between train station changes
    #[arg(long, default_value = "30")]
    segment_secs: u64,

    /// Seconds for one full vehicle loop including the depot stop
    #[arg(long, default_value = "90")]
    loop_secs: u64,

    /// Answer every Nth request with HTTP 503 (0 = never)
    #[arg(long, default_value = "0")]
    fail_every: u64,
}

struct Simulation {
    started: Instant,
    segment_secs: u64,
    loop_secs: u64,
    fail_every: u64,
    requests: AtomicU64,
}

impl Simulation {
    fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn station(&self, route: &[&str], segment_secs: u64) -> String {
        let stop = (self.elapsed_secs() as u64 / segment_secs.max(1)) as usize % route.len();
        route[stop].to_string()
    }

    fn trains(&self) -> Value {
        let freight = ["Iron Mine", "Smelter", "Port"];
        let express = ["North Yard", "South Yard"];

        let freight_at = self.station(&freight, self.segment_secs);
        let express_at = self.station(&express, self.segment_secs * 2);

        json!([
            train_json("Freight 1", &freight_at, &freight, "TS_SelfDriving", 45.0),
            train_json("Express 2", &express_at, &express, "TS_SelfDriving", 30.0),
            train_json("Shunter", "Port", &[], "TS_ManualDriving", 0.0),
        ])
    }

    fn vehicles(&self) -> Value {
        let phase = (self.elapsed_secs() / self.loop_secs.max(1) as f64).fract();

        let (x, y, rotation, speed) = if phase < DEPOT_DWELL {
            (0.0, 0.0, 90.0, 0.0)
        } else {
            // Circle through the depot, tangent to +x there
            let theta = TAU * (phase - DEPOT_DWELL) / (1.0 - DEPOT_DWELL);
            let x = LOOP_RADIUS * theta.sin();
            let y = LOOP_RADIUS - LOOP_RADIUS * theta.cos();
            let rotation = (90.0 + theta.to_degrees()).rem_euclid(360.0);
            (x, y, rotation, 55.0)
        };

        let fuel = 100.0 - (self.elapsed_secs() / 10.0) % 100.0;

        json!([{
            "Name": "Truck 1",
            "location": { "x": x, "y": y, "z": 0.0, "rotation": rotation },
            "ForwardSpeed": speed,
            "AutoPilot": true,
            "FuelType": "Fuel",
            "FuelInventory": fuel.floor(),
            "PathName": "Ore Run"
        }])
    }

    fn production(&self) -> Value {
        let drift = (self.elapsed_secs() / 60.0).sin();

        json!([
            prod_json("Iron Plate", 120.0 + 10.0 * drift, 90.0, 150.0, 150.0),
            prod_json("Screw", 380.0, 300.0 + 40.0 * drift, 400.0, 400.0),
        ])
    }

    fn should_fail(&self) -> bool {
        let n = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        self.fail_every > 0 && n % self.fail_every == 0
    }
}

fn train_json(name: &str, station: &str, route: &[&str], status: &str, power: f64) -> Value {
    let timetable: Vec<Value> = route.iter().map(|s| json!({ "StationName": s })).collect();
    json!({
        "Name": name,
        "PowerConsumed": power,
        "TrainStation": station,
        "Derailed": false,
        "Status": status,
        "TimeTable": timetable
    })
}

fn prod_json(name: &str, current: f64, consumed: f64, max_prod: f64, max_cons: f64) -> Value {
    json!({
        "Name": name,
        "ProdPercent": 100.0 * current / max_prod,
        "ConsPercent": 100.0 * consumed / max_cons,
        "CurrentProd": current,
        "CurrentConsumed": consumed,
        "MaxProd": max_prod,
        "MaxConsumed": max_cons
    })
}

fn respond(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    sim: Arc<Simulation>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = match (req.method(), req.uri().path()) {
        (&Method::GET, "/getTrains") => sim.trains(),
        (&Method::GET, "/getVehicles") => sim.vehicles(),
        (&Method::GET, "/getProdStats") => sim.production(),
        _ => return Ok(respond(StatusCode::NOT_FOUND, "Not Found".to_string())),
    };

    if sim.should_fail() {
        println!("[MOCK] {} -> 503 (simulated failure)", req.uri().path());
        return Ok(respond(StatusCode::SERVICE_UNAVAILABLE, "unavailable".to_string()));
    }

    Ok(respond(StatusCode::OK, body.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let sim = Arc::new(Simulation {
        started: Instant::now(),
        segment_secs: args.segment_secs,
        loop_secs: args.loop_secs,
        fail_every: args.fail_every,
        requests: AtomicU64::new(0),
    });

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    println!("[MOCK] FRM server listening on port {}", args.port);
    println!(
        "[MOCK] segment={}s loop={}s fail_every={}",
        args.segment_secs, args.loop_secs, args.fail_every
    );

    loop {
        let (stream, peer) = listener.accept().await?;
        let sim = sim.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let sim = sim.clone();
                async move { handle_request(req, sim).await }
            });

            let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            if let Err(e) = connection.await {
                eprintln!("[MOCK] Connection error from {}: {}", peer, e);
            }
        });
    }
}
