use anyhow::Result;
use reqwest::Client;
use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler, tool::ToolRouter},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::constants::{NWS_API_BASE, USER_AGENT};
use crate::feeds::{
    alert_records, earthquake_records, state_code, storm_event_records, EarthquakeFeed,
};
use crate::formatters::{format_layer, format_map_summary, format_resolution};
use crate::gazetteer::Gazetteer;
use crate::geocode::GeocodeResolver;
use crate::markers::{LayerKind, MapMarker, MarkerMap, PlacementRecord, ReconcileReport};
use crate::models::{
    AlertResponse, EarthquakeResponse, GetAlertMarkersRequest, GetEarthquakeMarkersRequest,
    PlaceStormEventsRequest, ResolveLocationRequest, SetLayerVisibilityRequest,
};
use crate::sequence::{CycleTicket, FeedSequencer};

/// Result of handing a fetch cycle's records to the map.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// `None` when a newer cycle had already been applied.
    pub report: Option<ReconcileReport>,
    /// The layer's markers after the cycle.
    pub markers: Vec<MapMarker>,
}

/// Disaster map service that handles MCP requests
#[derive(Clone)]
pub struct DisasterMap {
    client: Arc<Client>,
    map: Arc<Mutex<MarkerMap>>,
    sequencers: Arc<BTreeMap<LayerKind, FeedSequencer>>,
    default_feed: EarthquakeFeed,
    tool_router: ToolRouter<Self>,
}

impl DisasterMap {
    /// Creates a new service instance from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let resolver = GeocodeResolver::new(Arc::new(Gazetteer::builtin()), config.default_center()?);
        let sequencers = LayerKind::ALL
            .into_iter()
            .map(|kind| (kind, FeedSequencer::new()))
            .collect();

        Ok(Self {
            client: Arc::new(client),
            map: Arc::new(Mutex::new(MarkerMap::new(resolver, config.min_score))),
            sequencers: Arc::new(sequencers),
            default_feed: config.earthquake_feed()?,
            tool_router: Self::tool_router(),
        })
    }

    /// Makes an HTTP GET request and deserializes the JSON response
    async fn make_request<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Request failed with status: {}", response.status());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    fn sequencer(&self, kind: LayerKind) -> &FeedSequencer {
        &self.sequencers[&kind]
    }

    /// Applies a cycle's records unless a newer cycle got there first
    pub async fn apply_cycle(
        &self,
        kind: LayerKind,
        ticket: CycleTicket,
        records: Vec<PlacementRecord>,
    ) -> CycleOutcome {
        let mut map = self.map.lock().await;
        let report = if self.sequencer(kind).try_apply(ticket) {
            Some(map.replace_records(kind, records))
        } else {
            tracing::debug!(layer = %kind, cycle = ticket.get(), "discarding superseded cycle");
            None
        };
        CycleOutcome {
            report,
            markers: map.layer(kind).markers().to_vec(),
        }
    }

    /// Fetches NWS alerts for `area` and rebuilds the alerts layer
    pub async fn refresh_alerts(&self, area: &str) -> Result<CycleOutcome> {
        let ticket = self.sequencer(LayerKind::Alerts).begin();
        tracing::info!(area, cycle = ticket.get(), "fetching NWS alerts");

        let url = format!("{}/alerts/active?area={}", NWS_API_BASE, area);
        let alerts = self.make_request::<AlertResponse>(&url).await?;
        let records = alert_records(&alerts, area);
        Ok(self.apply_cycle(LayerKind::Alerts, ticket, records).await)
    }

    /// Fetches a USGS feed and rebuilds the earthquakes layer
    pub async fn refresh_earthquakes(&self, feed: EarthquakeFeed) -> Result<CycleOutcome> {
        let ticket = self.sequencer(LayerKind::Earthquakes).begin();
        tracing::info!(%feed, cycle = ticket.get(), "fetching USGS earthquakes");

        let quakes = self.make_request::<EarthquakeResponse>(&feed.url()).await?;
        let records = earthquake_records(&quakes);
        Ok(self.apply_cycle(LayerKind::Earthquakes, ticket, records).await)
    }

    fn format_outcome(kind: LayerKind, outcome: &CycleOutcome) -> String {
        match &outcome.report {
            Some(report) => format_layer(kind, &outcome.markers, report),
            None => format!(
                "A newer refresh of '{}' was applied first; showing current markers.\n\n{}",
                kind,
                format_layer(kind, &outcome.markers, &ReconcileReport {
                    added: outcome.markers.len(),
                    ..ReconcileReport::default()
                })
            ),
        }
    }
}

/// Upper-cases a comma-separated list of state codes, rejecting anything else
fn normalize_area(state: &str) -> Option<String> {
    let codes = state
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(state_code)
        .collect::<Option<Vec<_>>>()?;
    (!codes.is_empty()).then(|| codes.join(","))
}

#[tool_handler]
impl ServerHandler for DisasterMap {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-disaster-map".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "A disaster map service. Places NWS alerts, USGS earthquakes and NOAA storm \
                events as severity-styled map markers, geocoding free-text locations when \
                no coordinates are supplied."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl DisasterMap {
    /// Places active NWS alerts for one or more US states
    #[tool(description = "Fetch active NWS weather alerts for a US state and place them as map markers. Provide a two-letter state code (e.g., 'NC'), or several separated by commas ('NC,SC').")]
    async fn get_alert_markers(
        &self,
        Parameters(request): Parameters<GetAlertMarkersRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Placing alert markers for: {}", request.state);

        let area = normalize_area(&request.state).ok_or_else(|| {
            McpError::invalid_params(
                format!("'{}' is not a two-letter state code list", request.state),
                None,
            )
        })?;

        let outcome = self.refresh_alerts(&area).await.map_err(|e| {
            McpError::internal_error(format!("Failed to fetch alerts: {}", e), None)
        })?;

        let formatted = Self::format_outcome(LayerKind::Alerts, &outcome);

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Places earthquakes from a USGS summary feed
    #[tool(description = "Fetch a USGS earthquake summary feed and place each event at its epicenter. Optional feed name such as 'all_hour', 'all_day', '4.5_week' or 'significant_month'; defaults to the configured feed.")]
    async fn get_earthquake_markers(
        &self,
        Parameters(request): Parameters<GetEarthquakeMarkersRequest>,
    ) -> Result<CallToolResult, McpError> {
        let feed = match request.feed.as_deref() {
            Some(name) => name
                .parse::<EarthquakeFeed>()
                .map_err(|e| McpError::invalid_params(e.to_string(), None))?,
            None => self.default_feed,
        };
        tracing::info!("Placing earthquake markers from feed: {}", feed);

        let outcome = self.refresh_earthquakes(feed).await.map_err(|e| {
            McpError::internal_error(format!("Failed to fetch earthquakes: {}", e), None)
        })?;

        let formatted = Self::format_outcome(LayerKind::Earthquakes, &outcome);

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Places storm-event records supplied by the caller
    #[tool(description = "Place NOAA storm-event records on the map. Each event may carry location, county, state, deaths, injuries, damageProperty and damageCrops (USD), and optional coordinates {latitude, longitude}. Replaces the storm_events layer.")]
    async fn place_storm_events(
        &self,
        Parameters(request): Parameters<PlaceStormEventsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Placing {} storm events", request.events.len());

        let ticket = self.sequencer(LayerKind::StormEvents).begin();
        let records = storm_event_records(&request.events);
        let outcome = self.apply_cycle(LayerKind::StormEvents, ticket, records).await;

        let formatted = Self::format_outcome(LayerKind::StormEvents, &outcome);

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Resolves a free-text location to approximate coordinates
    #[tool(description = "Resolve a free-text location (e.g., 'Hatteras Island, NC', 'Outer Banks', 'CA') to approximate map coordinates. Optionally provide a fallback region such as a state code.")]
    async fn resolve_location(
        &self,
        Parameters(request): Parameters<ResolveLocationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let resolution = {
            let map = self.map.lock().await;
            map.resolver()
                .resolve(Some(&request.location), request.fallback_region.as_deref())
        };

        let formatted = format_resolution(&request.location, &resolution);

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Shows or hides a marker layer
    #[tool(description = "Show or hide a map layer: 'alerts', 'earthquakes' or 'storm_events'.")]
    async fn set_layer_visibility(
        &self,
        Parameters(request): Parameters<SetLayerVisibilityRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = request
            .layer
            .parse::<LayerKind>()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        tracing::info!("Setting layer {} visible={}", kind, request.visible);

        let formatted = {
            let mut map = self.map.lock().await;
            let report = map.set_visible(kind, request.visible);
            format_layer(kind, map.layer(kind).markers(), &report)
        };

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Summarizes rendered markers per layer
    #[tool(description = "Summarize how many markers each map layer currently renders and which layers are hidden.")]
    async fn get_map_summary(&self) -> Result<CallToolResult, McpError> {
        let formatted = {
            let map = self.map.lock().await;
            format_map_summary(&map.rendered_counts(), &map.hidden_layers())
        };

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }
}
