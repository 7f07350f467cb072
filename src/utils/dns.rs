use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{Resolver, TokioResolver};
use log::{debug, warn};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

/// Hickory backed resolver for the enhanced client. Falls back to cloudflare
/// when the system configuration can not be read.
#[derive(Debug, Default, Clone)]
pub struct HosterDnsResolver {
    resolver: Arc<OnceLock<TokioResolver>>,
}

impl HosterDnsResolver {
    fn resolver(&self) -> &TokioResolver {
        self.resolver.get_or_init(|| {
            match Resolver::builder(TokioConnectionProvider::default()) {
                Ok(builder) => builder.build(),
                Err(err) => {
                    warn!("system dns config unavailable ({err}), using cloudflare");
                    Resolver::builder_with_config(
                        ResolverConfig::cloudflare(),
                        TokioConnectionProvider::default(),
                    )
                    .build()
                }
            }
        })
    }
}

impl Resolve for HosterDnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let this = self.clone();

        Box::pin(async move {
            let lookup = this.resolver().lookup_ip(name.as_str()).await?;
            debug!("resolved hoster domain {}", name.as_str());

            let addrs: Addrs = Box::new(lookup.into_iter().map(|addr| SocketAddr::new(addr, 0)));
            Ok(addrs)
        })
    }
}
