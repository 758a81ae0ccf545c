//! Nova v2.1 client.

use super::session::Session;
use crate::error::{NotifyError, Result};
use crate::models::{Aggregate, Instance, ServerFilter};
use crate::providers::ComputeProvider;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;

#[derive(Deserialize, Debug)]
struct Link {
    rel: String,
    href: String,
}

/// One page of `GET /servers/detail`.
#[derive(Deserialize, Debug)]
struct ServerPage {
    servers: Vec<Instance>,
    #[serde(default)]
    servers_links: Vec<Link>,
}

impl ServerPage {
    fn next_href(&self) -> Option<String> {
        self.servers_links
            .iter()
            .find(|l| l.rel == "next")
            .map(|l| l.href.clone())
    }
}

#[derive(Deserialize)]
struct ServerBody {
    server: Instance,
}

#[derive(Deserialize)]
struct AggregatesBody {
    aggregates: Vec<Aggregate>,
}

struct PageRequest {
    url: String,
    query: Vec<(&'static str, String)>,
}

pub struct NovaClient {
    session: Arc<Session>,
    endpoint: String,
}

impl NovaClient {
    /// Use the compute endpoint of the session catalog.
    pub fn new(session: Arc<Session>) -> Result<NovaClient> {
        let endpoint = session.endpoint("compute")?;
        log::debug!("Nova endpoint {endpoint}");
        Ok(NovaClient { session, endpoint })
    }
}

/// Request for the page after `page`, which was fetched from `url`.
fn next_request(url: &str, page: &ServerPage) -> Result<Option<PageRequest>> {
    match page.next_href() {
        Some(href) if href == url => Err(NotifyError::Protocol {
            service: "compute",
            reason: format!("next link not unique - possible infinite loop: {href}"),
        }),
        Some(href) => Ok(Some(PageRequest {
            url: href,
            query: Vec::new(),
        })),
        None => Ok(None),
    }
}

/// Follow the `next` links from `first`, yielding servers lazily page by page.
fn walk_pages<'a, F, Fut>(first: PageRequest, fetch: F) -> BoxStream<'a, Result<Instance>>
where
    F: Fn(PageRequest) -> Fut + Send + 'a,
    Fut: Future<Output = Result<ServerPage>> + Send + 'a,
{
    stream::try_unfold(Some(first), move |next| {
        let pending = next.map(|request| (request.url.clone(), fetch(request)));
        async move {
            let Some((url, page)) = pending else {
                return Ok(None);
            };
            let page = page.await?;
            log::debug!("got {} server(s) from {url}", page.servers.len());
            let next = next_request(&url, &page)?;
            Ok::<_, NotifyError>(Some((page.servers, next)))
        }
    })
    .map_ok(|servers| stream::iter(servers.into_iter().map(Ok)))
    .try_flatten()
    .boxed()
}

#[async_trait]
impl ComputeProvider for NovaClient {
    fn list_servers(&self, filter: ServerFilter) -> BoxStream<'_, Result<Instance>> {
        let first = PageRequest {
            url: format!("{}/servers/detail", self.endpoint),
            query: filter.query_pairs(),
        };
        let session = self.session.clone();
        walk_pages(first, move |request: PageRequest| {
            let session = session.clone();
            async move {
                session
                    .get_json::<ServerPage>("compute", &request.url, &request.query, None)
                    .await
            }
        })
    }

    async fn get_server(&self, id: &str) -> Result<Instance> {
        let url = format!("{}/servers/{id}", self.endpoint);
        let body: ServerBody = self
            .session
            .get_json("compute", &url, &[], Some(("Server", id)))
            .await?;
        Ok(body.server)
    }

    async fn list_aggregates(&self) -> Result<Vec<Aggregate>> {
        let url = format!("{}/os-aggregates", self.endpoint);
        let body: AggregatesBody = self.session.get_json("compute", &url, &[], None).await?;
        log::debug!("got {} aggregate(s)", body.aggregates.len());
        Ok(body.aggregates)
    }
}
