//! Navigation for Nimbus
//!
//! Four top-level views (current weather, forecast, cities, settings), each
//! with its own back stack, plus a deep link to a specific city's weather.
//! Paths are parsed by [`Router`]; anything unrecognized becomes
//! [`Route::NotFound`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Route Parameters
// =============================================================================

/// Parameters for a route
pub type RouteParams = HashMap<String, String>;

// =============================================================================
// Route Definitions
// =============================================================================

/// All possible routes in the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", content = "params")]
pub enum Route {
    /// Current conditions for the selected city
    Current,
    /// Hourly and daily forecast
    Forecast,
    /// City search and favorites
    Cities {
        /// Prefilled search query
        #[serde(skip_serializing_if = "Option::is_none")]
        q: Option<String>,
    },
    /// Preferences
    Settings,
    /// Current conditions for a named city
    CityWeather {
        /// City display name
        city: String,
    },
    /// Unknown path
    NotFound,
}

impl Default for Route {
    fn default() -> Self {
        Route::Current
    }
}

impl Route {
    /// Get the URL path for this route
    pub fn to_path(&self) -> String {
        match self {
            Route::Current => "/".to_string(),
            Route::Forecast => "/forecast".to_string(),
            Route::Cities { q: Some(q) } if !q.is_empty() => {
                format!("/cities?q={}", urlencoding::encode(q))
            }
            Route::Cities { .. } => "/cities".to_string(),
            Route::Settings => "/settings".to_string(),
            Route::CityWeather { city } => format!("/weather/{}", urlencoding::encode(city)),
            Route::NotFound => "/not-found".to_string(),
        }
    }

    /// Translation key for the screen title
    pub fn title_key(&self) -> &'static str {
        match self {
            Route::Current | Route::CityWeather { .. } => "nav.current",
            Route::Forecast => "nav.forecast",
            Route::Cities { .. } => "nav.cities",
            Route::Settings => "nav.settings",
            Route::NotFound => "nav.not-found",
        }
    }

    /// Tab this route belongs to
    pub fn tab(&self) -> NavigationTab {
        match self {
            Route::Forecast => NavigationTab::Forecast,
            Route::Cities { .. } => NavigationTab::Cities,
            Route::Settings => NavigationTab::Settings,
            Route::Current | Route::CityWeather { .. } | Route::NotFound => NavigationTab::Current,
        }
    }

    /// City named by this route, if any
    pub fn city(&self) -> Option<&str> {
        match self {
            Route::CityWeather { city } => Some(city),
            _ => None,
        }
    }
}

// =============================================================================
// Navigation Tabs
// =============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTab {
    /// Current weather
    #[default]
    Current,
    /// Forecast
    Forecast,
    /// Cities
    Cities,
    /// Settings
    Settings,
}

impl NavigationTab {
    /// Get all tabs in order
    pub const ALL: [NavigationTab; 4] = [
        NavigationTab::Current,
        NavigationTab::Forecast,
        NavigationTab::Cities,
        NavigationTab::Settings,
    ];

    /// Get the root route for this tab
    pub fn root_route(&self) -> Route {
        match self {
            NavigationTab::Current => Route::Current,
            NavigationTab::Forecast => Route::Forecast,
            NavigationTab::Cities => Route::Cities { q: None },
            NavigationTab::Settings => Route::Settings,
        }
    }

    /// Get icon name for this tab
    pub fn icon(&self) -> &'static str {
        match self {
            NavigationTab::Current => "thermometer",
            NavigationTab::Forecast => "calendar",
            NavigationTab::Cities => "map-pin",
            NavigationTab::Settings => "settings",
        }
    }

    /// Translation key for the tab label
    pub fn label_key(&self) -> &'static str {
        self.root_route().title_key()
    }

    fn index(&self) -> usize {
        match self {
            NavigationTab::Current => 0,
            NavigationTab::Forecast => 1,
            NavigationTab::Cities => 2,
            NavigationTab::Settings => 3,
        }
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// A navigation stack entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    /// The route
    pub route: Route,
    /// Unique key for this entry
    pub key: String,
}

impl StackEntry {
    /// Create a new stack entry
    pub fn new(route: Route) -> Self {
        Self {
            route,
            key: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Back stack for a tab
///
/// The root entry is never popped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStack {
    /// Root entry
    root: StackEntry,
    /// Entries pushed above the root (bottom to top)
    pushed: Vec<StackEntry>,
}

impl NavigationStack {
    /// Create a new navigation stack with a root route
    pub fn new(root: Route) -> Self {
        Self {
            root: StackEntry::new(root),
            pushed: Vec::new(),
        }
    }

    /// Push a route onto the stack
    ///
    /// Pushing the route that is already on top is ignored.
    pub fn push(&mut self, route: Route) {
        if *self.current() != route {
            self.pushed.push(StackEntry::new(route));
        }
    }

    /// Pop the top route (returns true if popped, false if at root)
    pub fn pop(&mut self) -> bool {
        self.pushed.pop().is_some()
    }

    /// Pop to root
    pub fn pop_to_root(&mut self) {
        self.pushed.clear();
    }

    /// Replace the top route
    pub fn replace(&mut self, route: Route) {
        match self.pushed.last_mut() {
            Some(last) => *last = StackEntry::new(route),
            None => self.root = StackEntry::new(route),
        }
    }

    /// Get the current (top) route
    pub fn current(&self) -> &Route {
        &self.current_entry().route
    }

    /// Get the current stack entry
    pub fn current_entry(&self) -> &StackEntry {
        self.pushed.last().unwrap_or(&self.root)
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        !self.pushed.is_empty()
    }

    /// Get stack depth
    pub fn depth(&self) -> usize {
        self.pushed.len() + 1
    }
}

// =============================================================================
// Navigation State
// =============================================================================

/// Complete navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    /// Current active tab
    pub active_tab: NavigationTab,
    /// One stack per tab, in [`NavigationTab::ALL`] order
    stacks: [NavigationStack; 4],
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            active_tab: NavigationTab::Current,
            stacks: NavigationTab::ALL.map(|tab| NavigationStack::new(tab.root_route())),
        }
    }
}

impl NavigationState {
    /// Create a new navigation state
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack of a tab
    pub fn stack(&self, tab: NavigationTab) -> &NavigationStack {
        &self.stacks[tab.index()]
    }

    /// Get the current stack for the active tab
    pub fn current_stack(&self) -> &NavigationStack {
        self.stack(self.active_tab)
    }

    fn current_stack_mut(&mut self) -> &mut NavigationStack {
        &mut self.stacks[self.active_tab.index()]
    }

    /// Get the current route
    pub fn current_route(&self) -> &Route {
        self.current_stack().current()
    }

    /// Navigate to a route
    ///
    /// A tab's root route switches to that tab and pops it to its root.
    /// Anything else is pushed onto its own tab's stack, switching tabs if
    /// needed.
    pub fn navigate(&mut self, route: Route) {
        let tab = route.tab();
        self.active_tab = tab;

        if route == tab.root_route() {
            self.current_stack_mut().pop_to_root();
        } else {
            self.current_stack_mut().push(route);
        }
        tracing::debug!(path = %self.current_route().to_path(), "navigated");
    }

    /// Navigate to a path parsed by `router`
    pub fn open_path(&mut self, router: &Router, path: &str) -> &Route {
        let route = router.match_path(path);
        if route == Route::NotFound {
            tracing::debug!(path, "no route for path");
        }
        self.navigate(route);
        self.current_route()
    }

    /// Go back within the active tab
    pub fn go_back(&mut self) -> bool {
        self.current_stack_mut().pop()
    }

    /// Switch to a tab, keeping its stack
    pub fn switch_tab(&mut self, tab: NavigationTab) {
        self.active_tab = tab;
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        self.current_stack().can_go_back()
    }

    /// Reset entire navigation state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// Router
// =============================================================================

/// Route pattern for matching
struct RoutePattern {
    /// Pattern segments
    segments: Vec<PatternSegment>,
    /// Route builder
    builder: fn(RouteParams) -> Option<Route>,
}

/// Segment type in a pattern
#[derive(Debug, Clone)]
enum PatternSegment {
    /// Literal segment
    Literal(String),
    /// Parameter segment
    Param(String),
}

/// URL Router for parsing paths to routes
pub struct Router {
    /// Route patterns
    patterns: Vec<RoutePattern>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a new router with all routes
    pub fn new() -> Self {
        let mut router = Self { patterns: Vec::new() };

        router.add_route("/", |_| Some(Route::Current));
        router.add_route("/forecast", |_| Some(Route::Forecast));
        router.add_route("/cities", |params| {
            Some(Route::Cities {
                q: params.get("q").filter(|q| !q.trim().is_empty()).cloned(),
            })
        });
        router.add_route("/settings", |_| Some(Route::Settings));
        router.add_route("/weather/:city", |params| {
            let city = params.get("city")?.trim();
            if city.is_empty() {
                return None;
            }
            Some(Route::CityWeather { city: city.to_string() })
        });

        router
    }

    /// Add a route pattern
    fn add_route(&mut self, pattern: &str, builder: fn(RouteParams) -> Option<Route>) {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(param) => PatternSegment::Param(param.to_string()),
                None => PatternSegment::Literal(s.to_string()),
            })
            .collect();

        self.patterns.push(RoutePattern { segments, builder });
    }

    /// Match a path to a route
    pub fn match_path(&self, path: &str) -> Route {
        let (pathname, query) = match path.split_once('?') {
            Some((pathname, query)) => (pathname, Some(query)),
            None => (path, None),
        };

        let path_segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();

        for pattern in &self.patterns {
            if let Some(params) = Self::match_pattern(&pattern.segments, &path_segments, query) {
                if let Some(route) = (pattern.builder)(params) {
                    return route;
                }
            }
        }

        Route::NotFound
    }

    /// Match a pattern against path segments
    fn match_pattern(
        pattern: &[PatternSegment],
        path: &[&str],
        query: Option<&str>,
    ) -> Option<RouteParams> {
        if pattern.len() != path.len() {
            return None;
        }

        let mut params = RouteParams::new();

        for (segment, actual) in pattern.iter().zip(path.iter()) {
            match segment {
                PatternSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PatternSegment::Param(name) => {
                    params.insert(name.clone(), urlencoding::decode(actual).ok()?.into_owned());
                }
            }
        }

        Self::parse_query(query, &mut params);
        Some(params)
    }

    /// Parse query string into params
    fn parse_query(query: Option<&str>, params: &mut RouteParams) {
        let Some(query) = query else {
            return;
        };

        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                if let Ok(decoded) = urlencoding::decode(&value.replace('+', " ")) {
                    params.insert(key.to_string(), decoded.into_owned());
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_to_path() {
        assert_eq!(Route::Current.to_path(), "/");
        assert_eq!(Route::Forecast.to_path(), "/forecast");
        assert_eq!(Route::Settings.to_path(), "/settings");
        assert_eq!(Route::Cities { q: None }.to_path(), "/cities");
        assert_eq!(
            Route::CityWeather { city: "上海市".to_string() }.to_path(),
            "/weather/%E4%B8%8A%E6%B5%B7%E5%B8%82"
        );
    }

    #[test]
    fn test_router_matches_views() {
        let router = Router::new();
        assert_eq!(router.match_path("/"), Route::Current);
        assert_eq!(router.match_path("/forecast"), Route::Forecast);
        assert_eq!(router.match_path("/cities"), Route::Cities { q: None });
        assert_eq!(router.match_path("/settings/"), Route::Settings);
    }

    #[test]
    fn test_router_decodes_city() {
        let router = Router::new();
        assert_eq!(
            router.match_path("/weather/%E4%B8%8A%E6%B5%B7%E5%B8%82"),
            Route::CityWeather { city: "上海市".to_string() }
        );
        assert_eq!(
            router.match_path("/weather/New%20York"),
            Route::CityWeather { city: "New York".to_string() }
        );
    }

    #[test]
    fn test_router_roundtrips_paths() {
        let router = Router::new();
        let routes = [
            Route::Current,
            Route::Forecast,
            Route::Settings,
            Route::Cities { q: Some("广 州".to_string()) },
            Route::CityWeather { city: "深圳市".to_string() },
        ];
        for route in routes {
            assert_eq!(router.match_path(&route.to_path()), route);
        }
    }

    #[test]
    fn test_router_query_params() {
        let router = Router::new();
        assert_eq!(
            router.match_path("/cities?q=bei+jing"),
            Route::Cities { q: Some("bei jing".to_string()) }
        );
        assert_eq!(router.match_path("/cities?q="), Route::Cities { q: None });
    }

    #[test]
    fn test_unknown_paths_are_not_found() {
        let router = Router::new();
        assert_eq!(router.match_path("/radar"), Route::NotFound);
        assert_eq!(router.match_path("/weather"), Route::NotFound);
        assert_eq!(router.match_path("/weather/%20"), Route::NotFound);
        assert_eq!(router.match_path("/weather/a/b"), Route::NotFound);
    }

    #[test]
    fn test_stack_push_pop() {
        let mut stack = NavigationStack::new(Route::Current);
        assert!(!stack.can_go_back());
        assert!(!stack.pop());

        stack.push(Route::CityWeather { city: "成都市".to_string() });
        stack.push(Route::CityWeather { city: "成都市".to_string() });
        assert_eq!(stack.depth(), 2);

        assert!(stack.pop());
        assert_eq!(stack.current(), &Route::Current);
    }

    #[test]
    fn test_stack_entries_have_unique_keys() {
        let a = StackEntry::new(Route::Current);
        let b = StackEntry::new(Route::Current);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_navigate_switches_tabs_and_keeps_stacks() {
        let mut nav = NavigationState::new();
        nav.navigate(Route::CityWeather { city: "西安市".to_string() });
        assert_eq!(nav.active_tab, NavigationTab::Current);
        assert!(nav.can_go_back());

        nav.navigate(Route::Settings);
        assert_eq!(nav.active_tab, NavigationTab::Settings);
        assert!(!nav.can_go_back());

        nav.switch_tab(NavigationTab::Current);
        assert_eq!(nav.current_route().city(), Some("西安市"));

        assert!(nav.go_back());
        assert_eq!(nav.current_route(), &Route::Current);
        assert!(!nav.go_back());
    }

    #[test]
    fn test_navigating_to_root_pops_stack() {
        let mut nav = NavigationState::new();
        nav.navigate(Route::CityWeather { city: "武汉市".to_string() });
        nav.navigate(Route::Current);
        assert_eq!(nav.current_stack().depth(), 1);
    }

    #[test]
    fn test_open_path() {
        let router = Router::new();
        let mut nav = NavigationState::new();

        assert_eq!(nav.open_path(&router, "/forecast"), &Route::Forecast);
        assert_eq!(nav.open_path(&router, "/nowhere"), &Route::NotFound);
        assert_eq!(nav.active_tab, NavigationTab::Current);
        assert_eq!(Route::NotFound.title_key(), "nav.not-found");
    }

    #[test]
    fn test_tab_labels() {
        assert_eq!(NavigationTab::Cities.label_key(), "nav.cities");
        assert_eq!(NavigationTab::ALL.len(), 4);
    }
}
