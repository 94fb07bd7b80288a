use std::env;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};

const DEFAULT_ADDRESS: &str = "127.0.0.1:5555";
const USAGE: &str =
    "usage: resc-cli [--address <host:port>] --bandwidth <required> --level <1|2|3> <operator-bw>...";

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    address: String,
    required_bandwidth: f64,
    resiliency_level: i64,
    operator_bandwidths: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct OperatorRecord {
    name: String,
    #[serde(rename = "BW")]
    bandwidth: f64,
    delay: f64,
    packet_loss: f64,
}

#[derive(Debug, Serialize)]
struct CombinationRequest {
    operators: Vec<OperatorRecord>,
    required_bandwidth: f64,
    resiliency_level: i64,
}

fn parse_cli_options<I>(mut args: I) -> Result<CliOptions>
where
    I: Iterator<Item = String>,
{
    let mut address = DEFAULT_ADDRESS.to_string();
    let mut required_bandwidth = None;
    let mut resiliency_level = None;
    let mut operator_bandwidths = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--address" => {
                address = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --address. {USAGE}"))?;
            }
            "--bandwidth" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --bandwidth. {USAGE}"))?;
                required_bandwidth = Some(parse_number(&value)?);
            }
            "--level" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --level. {USAGE}"))?;
                resiliency_level = Some(
                    value
                        .parse::<i64>()
                        .with_context(|| format!("--level must be an integer, got '{value}'"))?,
                );
            }
            other if other.starts_with("--") => {
                return Err(anyhow!("unknown argument: {other}. {USAGE}"));
            }
            other => operator_bandwidths.push(parse_number(other)?),
        }
    }

    Ok(CliOptions {
        address,
        required_bandwidth: required_bandwidth
            .ok_or_else(|| anyhow!("missing required argument --bandwidth. {USAGE}"))?,
        resiliency_level: resiliency_level
            .ok_or_else(|| anyhow!("missing required argument --level. {USAGE}"))?,
        operator_bandwidths,
    })
}

fn parse_number(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .with_context(|| format!("'{value}' is not a number"))
}

fn build_request(options: &CliOptions) -> CombinationRequest {
    CombinationRequest {
        operators: options
            .operator_bandwidths
            .iter()
            .map(|bandwidth| OperatorRecord {
                name: format!("Operator{bandwidth}"),
                bandwidth: *bandwidth,
                delay: 0.0,
                packet_loss: 0.0,
            })
            .collect(),
        required_bandwidth: options.required_bandwidth,
        resiliency_level: options.resiliency_level,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = parse_cli_options(env::args().skip(1))?;
    let request = build_request(&options);
    eprintln!("request: {}", serde_json::to_string(&request)?);

    let stream = TcpStream::connect(&options.address)
        .await
        .with_context(|| format!("failed to connect to resc at {}", options.address))?;
    let (read_half, mut write_half) = stream.into_split();

    let mut encoded = serde_json::to_string(&request)?;
    encoded.push('\n');
    write_half.write_all(encoded.as_bytes()).await?;
    write_half.flush().await?;

    let mut lines = BufReader::new(read_half).lines();
    let line = lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("resc closed the connection without a response"))?;
    let response: serde_json::Value =
        serde_json::from_str(&line).context("failed to decode response")?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
