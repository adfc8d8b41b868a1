//! Route resolution with ordered provider fallback.
//!
//! The resolver owns a registry keyed by [`RouteKey`]. Each key moves through
//! `Idle -> Resolving(tier) -> Resolved | Superseded`:
//!
//! - at most one resolution per key is in flight; concurrent callers for the
//!   same key wait for it instead of issuing their own requests,
//! - provider tiers are tried strictly one after another, each once,
//! - a resolved route is cached until [`RouteResolver::reset`],
//! - asking for a different key through [`RouteResolver::resolve`] supersedes
//!   the previous key's in-flight resolution, whose result is then dropped.
//!
//! [`RouteResolver::resolve`] cannot fail: when every provider fails the
//! straight-line estimate is returned.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ResolverConfig, RoutingConfig};
use crate::error::ProviderError;
use crate::model::{ProviderTier, Route, RouteKey, RouteRequest};
use crate::osrm::DirectApiProvider;
use crate::primary::PrimaryRoadProvider;
use crate::secondary::SecondaryRoadProvider;
use crate::traits::RouteProvider;

/// Observable lifecycle of one route key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Idle,
    Resolving(ProviderTier),
    Resolved,
    Superseded,
}

pub struct RouteResolver {
    providers: Vec<Box<dyn RouteProvider>>,
    config: ResolverConfig,
    registry: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    entries: HashMap<RouteKey, Entry>,
    /// Key of the most recent [`RouteResolver::resolve`] call.
    latest: Option<RouteKey>,
    /// Route for `latest`, once it resolved.
    displayed: Option<Route>,
}

enum Entry {
    Resolving(Arc<Flight>),
    Resolved(Route),
    /// The flight is kept so a later request for the same key can resume it
    /// while its provider call is still running.
    Superseded(Arc<Flight>),
}

/// One in-flight resolution, shared by its leader and any waiters.
struct Flight {
    progress: Mutex<Progress>,
    outcome: Mutex<Option<Route>>,
    ready: Condvar,
}

struct Progress {
    tier: ProviderTier,
    superseded: bool,
    /// A retired flight makes no further provider calls and its result is
    /// dropped. It cannot be resumed.
    retired: bool,
}

impl Flight {
    fn new() -> Self {
        Self {
            progress: Mutex::new(Progress {
                tier: ProviderTier::Primary,
                superseded: false,
                retired: false,
            }),
            outcome: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn enter(&self, tier: ProviderTier) {
        lock(&self.progress).tier = tier;
    }

    fn current_tier(&self) -> ProviderTier {
        lock(&self.progress).tier
    }

    fn supersede(&self) {
        lock(&self.progress).superseded = true;
    }

    fn is_superseded(&self) -> bool {
        lock(&self.progress).superseded
    }

    fn is_retired(&self) -> bool {
        lock(&self.progress).retired
    }

    /// Whether the leader should carry on. A superseded flight retires here.
    fn keep_going(&self) -> bool {
        let mut progress = lock(&self.progress);
        progress.retired |= progress.superseded;
        !progress.retired
    }

    /// Take a superseded flight back unless it has already retired.
    fn resume(&self) -> bool {
        let mut progress = lock(&self.progress);
        if progress.retired {
            return false;
        }
        progress.superseded = false;
        true
    }

    fn finish(&self, route: Route) {
        *lock(&self.outcome) = Some(route);
        self.ready.notify_all();
    }

    fn wait(&self) -> Route {
        let mut outcome = lock(&self.outcome);
        loop {
            if let Some(route) = outcome.as_ref() {
                return route.clone();
            }
            outcome = self
                .ready
                .wait(outcome)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

enum Role {
    Leader(Arc<Flight>),
    Waiter(Arc<Flight>),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RouteResolver {
    /// Providers are tried in [`ProviderTier`] order regardless of the order
    /// they are passed in.
    pub fn new(mut providers: Vec<Box<dyn RouteProvider>>, config: ResolverConfig) -> Self {
        providers.sort_by_key(|provider| provider.tier());
        Self {
            providers,
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Resolver backed by the primary, secondary and direct OSRM HTTP providers.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, reqwest::Error> {
        let providers: Vec<Box<dyn RouteProvider>> = vec![
            Box::new(PrimaryRoadProvider::new(config.primary.clone())?),
            Box::new(SecondaryRoadProvider::new(config.secondary.clone())?),
            Box::new(DirectApiProvider::new(config.direct.clone())?),
        ];
        Ok(Self::new(providers, config.resolver.clone()))
    }

    /// Resolve the route the user asked for most recently.
    ///
    /// A different key than the previous call supersedes that call's
    /// in-flight resolution.
    pub fn resolve(&self, request: RouteRequest) -> Route {
        self.resolve_key(request, true)
    }

    /// Resolve independent requests concurrently.
    ///
    /// Batch resolutions share the cache and the single-flight registry but
    /// never supersede the interactive request. A batch caller whose flight
    /// gets superseded resolves its key again instead of taking the estimate.
    pub fn resolve_many(&self, requests: &[RouteRequest]) -> Vec<Route> {
        requests
            .par_iter()
            .map(|request| self.resolve_key(*request, false))
            .collect()
    }

    /// Route for the most recently requested key, once it has resolved.
    pub fn latest_route(&self) -> Option<Route> {
        lock(&self.registry).displayed.clone()
    }

    pub fn state(&self, key: &RouteKey) -> ResolutionState {
        match lock(&self.registry).entries.get(key) {
            None => ResolutionState::Idle,
            Some(Entry::Resolving(flight)) => ResolutionState::Resolving(flight.current_tier()),
            Some(Entry::Resolved(_)) => ResolutionState::Resolved,
            Some(Entry::Superseded(_)) => ResolutionState::Superseded,
        }
    }

    /// Forget every cached route and abandon in-flight resolutions.
    ///
    /// Flights still inside a provider call stay registered as superseded so
    /// that asking for their key again resumes them.
    pub fn reset(&self) {
        let mut registry = lock(&self.registry);
        let entries = std::mem::take(&mut registry.entries);
        for (key, entry) in entries {
            if let Entry::Resolving(flight) | Entry::Superseded(flight) = entry {
                flight.supersede();
                if !flight.is_retired() {
                    registry.entries.insert(key, Entry::Superseded(flight));
                }
            }
        }
        registry.latest = None;
        registry.displayed = None;
        debug!("route resolver reset");
    }

    fn resolve_key(&self, request: RouteRequest, interactive: bool) -> Route {
        let key = request.key();

        loop {
            let role = {
                let mut registry = lock(&self.registry);
                if interactive {
                    Self::mark_latest(&mut registry, &key);
                }
                match registry.entries.get(&key) {
                    Some(Entry::Resolved(route)) => {
                        let route = route.clone();
                        debug!(%key, source = %route.source, "route cache hit");
                        if interactive {
                            registry.displayed = Some(route.clone());
                        }
                        return route;
                    }
                    Some(Entry::Resolving(flight)) => Role::Waiter(Arc::clone(flight)),
                    Some(Entry::Superseded(flight)) if flight.resume() => {
                        let flight = Arc::clone(flight);
                        debug!(%key, "resuming superseded resolution");
                        registry
                            .entries
                            .insert(key.clone(), Entry::Resolving(Arc::clone(&flight)));
                        Role::Waiter(flight)
                    }
                    _ => {
                        let flight = Arc::new(Flight::new());
                        registry
                            .entries
                            .insert(key.clone(), Entry::Resolving(Arc::clone(&flight)));
                        Role::Leader(flight)
                    }
                }
            };

            let (route, flight) = match role {
                Role::Waiter(flight) => {
                    debug!(%key, "joining in-flight resolution");
                    (flight.wait(), flight)
                }
                Role::Leader(flight) => {
                    let route = self.run_tiers(&request, &key, &flight);
                    self.complete(&key, &flight, &route);
                    flight.finish(route.clone());
                    (route, flight)
                }
            };

            if interactive || !flight.is_retired() {
                return route;
            }
            debug!(%key, "batch caller lost its flight to supersession, resolving again");
        }
    }

    fn mark_latest(registry: &mut Registry, key: &RouteKey) {
        let previous = match registry.latest.replace(key.clone()) {
            Some(previous) if &previous != key => previous,
            _ => return,
        };
        registry.displayed = None;

        if let Some(Entry::Resolving(flight)) = registry.entries.get(&previous) {
            let flight = Arc::clone(flight);
            flight.supersede();
            debug!(key = %previous, by = %key, "resolution superseded");
            registry.entries.insert(previous, Entry::Superseded(flight));
        }
    }

    fn run_tiers(&self, request: &RouteRequest, key: &RouteKey, flight: &Flight) -> Route {
        for provider in &self.providers {
            if !flight.keep_going() {
                debug!(%key, "skipping remaining providers for superseded resolution");
                break;
            }

            let tier = provider.tier();
            flight.enter(tier);
            let timeout = self.config.timeout_for(tier);
            // A panicking provider counts as a failed tier so waiters are released.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                provider.route(request.origin, request.destination, timeout)
            }))
            .unwrap_or_else(|_| Err(ProviderError::unavailable(tier, "provider panicked")));

            match outcome {
                Ok(route) => {
                    info!(
                        %key,
                        %tier,
                        distance_km = route.distance_km,
                        duration_minutes = route.duration_minutes,
                        "route resolved"
                    );
                    return route;
                }
                Err(err) => {
                    warn!(%key, %tier, error = %err, "routing provider failed, falling back")
                }
            }
        }

        flight.enter(ProviderTier::StraightLineEstimate);
        if !flight.is_superseded() {
            warn!(%key, "all routing providers failed, using straight-line estimate");
        }
        self.config
            .estimator()
            .estimate(request.origin, request.destination)
    }

    fn complete(&self, key: &RouteKey, flight: &Arc<Flight>, route: &Route) {
        let mut registry = lock(&self.registry);
        if !flight.keep_going() {
            debug!(%key, "discarding result of superseded resolution");
            return;
        }

        let owns_entry = matches!(
            registry.entries.get(key),
            Some(Entry::Resolving(current)) if Arc::ptr_eq(current, flight)
        );
        if !owns_entry {
            return;
        }

        registry
            .entries
            .insert(key.clone(), Entry::Resolved(route.clone()));
        if registry.latest.as_ref() == Some(key) {
            registry.displayed = Some(route.clone());
        }
    }
}
