//! describe-services: dump what decoration produces for two stub services.
//!
//! One service implements `Servicer` itself, the other is a plain struct
//! wrapped with `rpc_service`. Both end up with the same three routes.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug describe-services --service decorated-service.Service
//! ```

use std::sync::Arc;

use clap::Parser;
use protoflux::prelude::*;
use protoflux::{Mapping, RegistryError, Router, Service};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "describe-services")]
#[command(about = "Print RPC descriptors and the merged routing table")]
struct Args {
    /// Only describe the service with this public name
    #[arg(long)]
    service: Option<String>,
}

#[derive(Debug)]
struct Req;
impl Message for Req {}

#[derive(Debug)]
struct Res;
impl Message for Res {}

struct StubbedService {
    rank: u32,
    name: String,
}

impl StubbedService {
    async fn one(self: Arc<Self>, _request: Req) -> Result<Res, RpcError> {
        Ok(Res)
    }

    async fn two_for_one(
        self: Arc<Self>,
        _request: Req,
    ) -> Result<ResponseStream<Res>, RpcError> {
        Ok(ResponseStream::iter([Res]))
    }

    async fn three(
        self: Arc<Self>,
        requests: Streaming<Req>,
    ) -> Result<ResponseStream<Res>, RpcError> {
        Ok(ResponseStream::new(requests.map(|req| req.map(|_| Res))))
    }
}

impl Servicer for StubbedService {
    fn service_name(&self) -> &str {
        "stubbed-service.Service"
    }

    fn rpc_methods(&self) -> Result<Vec<RpcMethod<Self>>, TypeResolutionError> {
        Ok(vec![
            rpc!(StubbedService::one)?,
            rpc!(StubbedService::two_for_one)?,
            rpc!(StubbedService::three)?.with_rpc_name("FiveSix"),
        ])
    }
}

struct DecoratedService {
    rank: u32,
    name: String,
}

impl DecoratedService {
    async fn one(self: Arc<Self>, _request: Req) -> Result<Res, RpcError> {
        Ok(Res)
    }

    async fn two_for_one(
        self: Arc<Self>,
        _request: Req,
    ) -> Result<ResponseStream<Res>, RpcError> {
        Ok(ResponseStream::iter([Res]))
    }

    async fn three(
        self: Arc<Self>,
        requests: Streaming<Req>,
    ) -> Result<ResponseStream<Res>, RpcError> {
        Ok(ResponseStream::new(requests.map(|req| req.map(|_| Res))))
    }
}

fn decorated_service() -> Result<Service<DecoratedService>, TypeResolutionError> {
    let instance = DecoratedService {
        rank: 0,
        name: "bar".into(),
    };
    rpc_service("decorated-service.Service", instance)
        .handler(handler!(DecoratedService::one))?
        .handler(handler!(DecoratedService::two_for_one))?
        .handler(rpc_name("FiveSix", handler!(DecoratedService::three)))
}

fn print_methods<S>(methods: &[RpcMethod<S>]) {
    for method in methods {
        println!("{}", method.handler().ident());
        println!("  public_name:   {}", method.public_name());
        println!("  cardinality:   {}", method.cardinality());
        println!("  request_type:  {}", method.request_type().name());
        println!("  response_type: {}", method.response_type().name());
    }
}

fn print_mapping(mapping: &Mapping) {
    for (path, entry) in mapping {
        println!(
            "  {} => ({}, {}, {})",
            path,
            entry.cardinality,
            entry.request_type,
            entry.response_type
        );
    }
}

fn wanted(filter: Option<&str>, service: &str) -> bool {
    filter.is_none_or(|name| name == service)
}

fn run(args: &Args) -> Result<(), RegistryError> {
    let filter = args.service.as_deref();

    let stubbed = Arc::new(StubbedService {
        rank: 1,
        name: "foo".into(),
    });
    let decorated = decorated_service()?;

    let mut router = Router::new();

    if wanted(filter, stubbed.as_ref().service_name()) {
        println!(
            "{} (rank {}, name {})",
            Servable::service_name(&stubbed),
            stubbed.rank,
            stubbed.name
        );
        print_methods(&stubbed.rpc_methods()?);
        print_mapping(&stubbed.mapping()?);
        println!();
        if let Err(err) = router.add_service(&stubbed) {
            tracing::warn!(%err, "skipping stubbed service");
        }
    }

    if wanted(filter, decorated.name()) {
        let instance = decorated.instance();
        println!("{} (rank {}, name {})", decorated.name(), instance.rank, instance.name);
        print_methods(decorated.methods());
        print_mapping(&decorated.mapping()?);
        println!();
        if let Err(err) = router.add_service(&decorated) {
            tracing::warn!(%err, "skipping decorated service");
        }
    }

    println!("routing table ({} routes)", router.route_count());
    print_mapping(router.routes());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(?args, "describing services");

    if let Err(err) = run(&args) {
        tracing::error!(%err, "failed to describe services");
        std::process::exit(1);
    }
}
