//! WASM application entry point.

use crate::dashboard::{start_refresh, Dashboard};
use crate::error::DashboardError;
use crate::pages::{BuildsPage, DetailKind, DetailPage, Page, TestsPage};
use crate::refresh::RefreshTrigger;
use crate::route::{PageParams, Route};
use crate::source::{DataSource, FetchError, FetchRequest, FetchResponse, FetchResult};
use crate::time_window::{Preset, SystemClock, TimeWindowController};
use buildscope_widgets::{ChartRequest, ChartSink};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{window, Element};

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::JSON::stringify(value)
                .ok()
                .and_then(|s| s.as_string())
        })
        .unwrap_or_else(|| "unknown JavaScript error".to_string())
}

fn to_js(err: DashboardError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Data source backed by a JavaScript function taking the request JSON and
/// returning a Promise of the response object.
struct JsSource {
    fetch: js_sys::Function,
}

impl JsSource {
    fn call(&self, request: &FetchRequest) -> Result<js_sys::Promise, FetchError> {
        let json = serde_json::to_string(request)
            .map_err(|e| FetchError::Transport(format!("cannot encode request: {e}")))?;
        let value = self
            .fetch
            .call1(&JsValue::NULL, &JsValue::from_str(&json))
            .map_err(|e| FetchError::Transport(js_message(&e)))?;
        value
            .dyn_into::<js_sys::Promise>()
            .map_err(|_| FetchError::Transport("fetch function must return a Promise".to_string()))
    }
}

impl DataSource for JsSource {
    fn fetch(&self, request: &FetchRequest) -> LocalBoxFuture<'static, FetchResult> {
        let promise = self.call(request);
        async move {
            let value = JsFuture::from(promise?)
                .await
                .map_err(|e| FetchError::Transport(js_message(&e)))?;
            let text = js_sys::JSON::stringify(&value)
                .map_err(|e| FetchError::Transport(js_message(&e)))?
                .as_string()
                .unwrap_or_default();
            serde_json::from_str::<FetchResponse>(&text)
                .map_err(|e| FetchError::Transport(format!("cannot decode response: {e}")))
        }
        .boxed_local()
    }
}

/// Chart sink calling a JavaScript `draw(kind, seriesJson)` function.
struct JsCharts {
    draw: js_sys::Function,
}

impl ChartSink for JsCharts {
    fn draw(&mut self, request: &ChartRequest) {
        let kind = serde_json::to_string(&request.kind).unwrap_or_default();
        let series = serde_json::to_string(&request.series).unwrap_or_default();
        if let Err(e) = self.draw.call2(
            &JsValue::NULL,
            &JsValue::from_str(kind.trim_matches('"')),
            &JsValue::from_str(&series),
        ) {
            web_sys::console::error_1(&JsValue::from_str(&format!(
                "chart draw failed: {}",
                js_message(&e)
            )));
        }
    }
}

type Shared<P> = Rc<RefCell<Dashboard<P, SystemClock>>>;

enum AnyDashboard {
    Builds(Shared<BuildsPage>),
    Tests(Shared<TestsPage>),
    Detail(Shared<DetailPage<JsCharts>>),
}

/// A dashboard mounted into a container element.
#[wasm_bindgen]
pub struct App {
    dashboard: AnyDashboard,
    source: Rc<JsSource>,
    container: Element,
}

fn render<P: Page>(dashboard: &Shared<P>, container: &Element) {
    container.set_inner_html(&dashboard.borrow().to_html());
}

fn spawn_refresh<P: Page + 'static>(
    dashboard: &Shared<P>,
    source: &Rc<JsSource>,
    container: &Element,
    trigger: RefreshTrigger,
) {
    let pending = start_refresh(dashboard, source.as_ref(), trigger);
    render(dashboard, container);
    let Some(pending) = pending else {
        return;
    };
    let dashboard = Rc::clone(dashboard);
    let container = container.clone();
    spawn_local(async move {
        match pending.await {
            Ok(Some(_)) => render(&dashboard, &container),
            Ok(None) => {}
            Err(e) => web_sys::console::error_1(&JsValue::from_str(&e.to_string())),
        }
    });
}

macro_rules! with_dashboard {
    ($self:ident, $d:ident => $body:expr) => {
        match &$self.dashboard {
            AnyDashboard::Builds($d) => $body,
            AnyDashboard::Tests($d) => $body,
            AnyDashboard::Detail($d) => $body,
        }
    };
}

#[wasm_bindgen]
impl App {
    /// Mount the dashboard for the current location into `container_id`.
    ///
    /// `fetch` receives the request JSON and returns a Promise of the
    /// response; `draw_chart` receives a chart kind and series JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_id: &str,
        fetch: js_sys::Function,
        draw_chart: js_sys::Function,
    ) -> Result<App, JsValue> {
        console_error_panic_hook::set_once();

        let win = window().ok_or("No window")?;
        let document = win.document().ok_or("No document")?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| format!("Container '{container_id}' not found"))?;

        let location = win.location();
        let path = location.pathname()?;
        let params = PageParams::parse(&location.search()?);
        let route = Route::from_path(&path).ok_or_else(|| format!("No dashboard at '{path}'"))?;
        let root_url = container.get_attribute("data-root-url").unwrap_or_default();

        let time_window = TimeWindowController::with_range(SystemClock, params.start_ms, params.end_ms)
            .map_err(|e| to_js(e.into()))?;

        let dashboard = match route {
            Route::Builds => AnyDashboard::Builds(Rc::new(RefCell::new(Dashboard::new(
                BuildsPage::new().map_err(to_js)?.root_url(root_url),
                time_window,
            )))),
            Route::Tests => AnyDashboard::Tests(Rc::new(RefCell::new(Dashboard::new(
                TestsPage::new().map_err(to_js)?.root_url(root_url),
                time_window,
            )))),
            Route::BuildHistory | Route::TestHistory => {
                let kind = if route == Route::BuildHistory {
                    DetailKind::Build
                } else {
                    DetailKind::TestCase
                };
                let page = DetailPage::from_params(kind, &params, JsCharts { draw: draw_chart })
                    .map_err(to_js)?
                    .root_url(root_url);
                AnyDashboard::Detail(Rc::new(RefCell::new(Dashboard::new(page, time_window))))
            }
        };

        Ok(Self {
            dashboard,
            source: Rc::new(JsSource { fetch }),
            container,
        })
    }

    /// First load. Detail pages also load their typeahead entries.
    pub fn start(&self) {
        if let AnyDashboard::Detail(d) = &self.dashboard {
            let request = {
                let d = d.borrow();
                d.page().choices_request(d.window().current_window())
            };
            let fetch = self.source.fetch(&request);
            let d = Rc::clone(d);
            spawn_local(async move {
                let result = fetch.await;
                if let Err(e) = d.borrow_mut().page_mut().load_choices(result) {
                    tracing::warn!(error = %e, "typeahead entries unavailable");
                }
            });
        }
        self.refresh(RefreshTrigger::InitialLoad);
    }

    fn refresh(&self, trigger: RefreshTrigger) {
        with_dashboard!(self, d => spawn_refresh(d, &self.source, &self.container, trigger));
    }

    fn rerender(&self) {
        with_dashboard!(self, d => render(d, &self.container));
    }

    /// Select a preset time window by label (`6h` .. `6m`).
    pub fn select_preset(&self, label: &str) -> Result<(), JsValue> {
        let preset: Preset = label.parse().map_err(|e: crate::TimeWindowError| to_js(e.into()))?;
        let trigger = with_dashboard!(self, d => d.borrow_mut().select_preset(preset));
        self.refresh(trigger);
        Ok(())
    }

    /// Select a custom time window in epoch milliseconds.
    pub fn set_window(&self, start_ms: f64, end_ms: f64) -> Result<(), JsValue> {
        let (start, end) = (start_ms as i64, end_ms as i64);
        let trigger = with_dashboard!(self, d => d.borrow_mut().set_custom_window(start, end))
            .map_err(to_js)?;
        self.refresh(trigger);
        Ok(())
    }

    /// Sort by a column header of `table`.
    pub fn click_header(&self, table: &str, key: &str) -> Result<(), JsValue> {
        let result = match &self.dashboard {
            AnyDashboard::Builds(d) => d.borrow_mut().page_mut().click_header(key).map(drop),
            AnyDashboard::Tests(d) => match d.borrow_mut().page_mut().panel_mut(table) {
                Some(panel) => panel.click_header(key).map(drop),
                None => Ok(()),
            },
            AnyDashboard::Detail(d) => d.borrow_mut().page_mut().click_header(key).map(drop),
        };
        result.map_err(to_js)?;
        self.rerender();
        Ok(())
    }

    /// Expand or collapse a project on the builds page.
    pub fn toggle(&self, project: &str) -> Result<(), JsValue> {
        if let AnyDashboard::Builds(d) = &self.dashboard {
            d.borrow_mut().page_mut().toggle(project).map_err(to_js)?;
            self.rerender();
        }
        Ok(())
    }

    /// Show one project on the builds page.
    pub fn filter(&self, project: &str) -> Result<(), JsValue> {
        if let AnyDashboard::Builds(d) = &self.dashboard {
            d.borrow_mut().page_mut().apply_filter(project).map_err(to_js)?;
            self.rerender();
        }
        Ok(())
    }

    /// Show every project on the builds page.
    pub fn clear_filter(&self) -> Result<(), JsValue> {
        if let AnyDashboard::Builds(d) = &self.dashboard {
            d.borrow_mut().page_mut().clear_filter().map_err(to_js)?;
            self.rerender();
        }
        Ok(())
    }

    /// Suggestions for the filter box or the entity input.
    pub fn suggestions(&self, query: &str) -> Vec<String> {
        let owned = |v: Vec<&str>| v.into_iter().map(str::to_string).collect();
        match &self.dashboard {
            AnyDashboard::Builds(d) => owned(d.borrow().page().filter_suggestions(query)),
            AnyDashboard::Detail(d) => owned(d.borrow().page().suggest(query)),
            AnyDashboard::Tests(_) => Vec::new(),
        }
    }

    /// Switch a detail page to the entity with this label.
    pub fn choose(&self, label: &str) -> bool {
        let AnyDashboard::Detail(d) = &self.dashboard else {
            return false;
        };
        let trigger = d.borrow().page().choose(label);
        match trigger {
            Some(trigger) => {
                self.refresh(trigger);
                true
            }
            None => false,
        }
    }

    /// Toggle a result filter on a detail page.
    pub fn toggle_result(&self, result: &str) -> Result<(), JsValue> {
        if let AnyDashboard::Detail(d) = &self.dashboard {
            d.borrow_mut().page_mut().toggle_result(result).map_err(to_js)?;
            self.rerender();
        }
        Ok(())
    }

    /// The chart library finished loading.
    pub fn charts_ready(&self) {
        if let AnyDashboard::Detail(d) = &self.dashboard {
            d.borrow_mut().page_mut().charts_ready();
        }
    }
}

/// Initialize panic hook for better error messages.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
