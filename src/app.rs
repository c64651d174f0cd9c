//! Root application module.
//!
//! Contains the main App component, AppContext definition, and
//! application-level setup logic following Leptos conventions.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::AppRouter;
use crate::config::AppConfig;
use crate::core::listing::ListingStore;
use crate::core::selectors::CapabilityContext;
use crate::core::{
    ApiClient, BrowserSession, BrowserState, DataStorageCache, ListingOptions, UsersApi,
};
use crate::models::{AppRoute, CurrentUser};
use crate::utils::{BrowserAuthFlow, BrowserTransport, current_timestamp};

/// Endpoint client used by the whole application.
pub type Api = ApiClient<BrowserTransport, BrowserAuthFlow>;

/// Storage browser bound to the browser transport.
pub type Session = BrowserSession<Api>;

// ============================================================================
// AppContext
// ============================================================================

/// Application-wide reactive context.
///
/// This context is provided at the root of the component tree and can be
/// accessed from any child component using `use_context::<AppContext>()`.
///
/// The browser session lives outside the reactive graph: it owns a
/// [`Store`](crate::core::Store) whose subscription bumps [`tick`](Self::tick),
/// and views read it through [`AppContext::browser`].
///
/// # Note
///
/// This struct is `Copy` because all fields are Leptos signals or stored
/// values, which are cheap to copy.
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Deployment configuration.
    pub config: StoredValue<AppConfig>,

    /// Endpoint client shared by every screen.
    pub api: StoredValue<Rc<Api>, LocalStorage>,

    /// Storage browser session.
    pub session: StoredValue<Rc<Session>, LocalStorage>,

    /// Incremented after every change of the browser store.
    pub tick: RwSignal<u64>,

    /// Signed-in user, `None` until `whoami` answered.
    pub user: RwSignal<Option<CurrentUser>>,

    /// Current hash route.
    pub route: RwSignal<AppRoute>,
}

impl AppContext {
    /// Creates the context and wires the store subscription.
    pub fn new(config: AppConfig) -> Self {
        let api = Rc::new(ApiClient::new(
            config.api.clone(),
            config.auth,
            BrowserTransport::default(),
            BrowserAuthFlow,
        ));
        let session = Rc::new(BrowserSession::new(
            api.clone(),
            Rc::new(DataStorageCache::default()),
            ListingOptions::from(config.listing),
            config.listing.archive_gate,
        ));

        let tick = RwSignal::new(0u64);
        session
            .store()
            .subscribe(move |_| tick.update(|t| *t = t.wrapping_add(1)));

        Self {
            config: StoredValue::new(config),
            api: StoredValue::new_local(api),
            session: StoredValue::new_local(session),
            tick,
            user: RwSignal::new(None),
            route: RwSignal::new(AppRoute::current()),
        }
    }

    pub fn api(&self) -> Rc<Api> {
        self.api.get_value()
    }

    pub fn session(&self) -> Rc<Session> {
        self.session.get_value()
    }

    /// Read the browser state; reactive on the store tick.
    pub fn browser<T>(&self, select: impl FnOnce(&BrowserState) -> T) -> T {
        self.tick.track();
        self.session.with_value(|session| session.store().with(select))
    }

    /// Read the browser state without subscribing (event handlers).
    pub fn browser_untracked<T>(&self, select: impl FnOnce(&BrowserState) -> T) -> T {
        self.session.with_value(|session| session.store().with(select))
    }

    /// Read the listing with the capability context of its rows; reactive
    /// on the store tick.
    pub fn capabilities<T>(
        &self,
        select: impl FnOnce(&ListingStore, &CapabilityContext<'_>) -> T,
    ) -> T {
        self.tick.track();
        let now = self.now();
        self.session
            .with_value(|session| session.with_capabilities(&now, select))
    }

    /// Run an async session operation without blocking the view.
    ///
    /// Failures are recorded in the browser store by the session.
    pub fn spawn<F, Fut, T>(&self, operation: F)
    where
        F: FnOnce(Rc<Session>) -> Fut,
        Fut: Future<Output = T> + 'static,
        T: 'static,
    {
        let operation = operation(self.session());
        spawn_local(async move {
            operation.await;
        });
    }

    /// Timestamp used to evaluate restore expiry.
    pub fn now(&self) -> String {
        current_timestamp()
    }

    /// Load the signed-in user and hand it to the browser session.
    fn load_user(&self) {
        let ctx = *self;
        spawn_local(async move {
            match ctx.api().current_user().await {
                Ok(user) => {
                    tracing::info!(user = %user.user_name, "signed in");
                    ctx.session().set_user(Some(user.clone()));
                    ctx.user.set(Some(user));
                }
                Err(error) => tracing::warn!(%error, "failed to load current user"),
            }
        });
    }
}

/// Root application component with error boundary.
///
/// This component:
/// - Creates and provides the global AppContext
/// - Loads the signed-in user
/// - Wraps the app in an ErrorBoundary for graceful error handling
#[component]
pub fn App(config: AppConfig) -> impl IntoView {
    let ctx = AppContext::new(config);
    provide_context(ctx);
    ctx.load_user();

    view! {
        <ErrorBoundary
            fallback=|errors| view! {
                <div style="
                    display: flex;
                    flex-direction: column;
                    align-items: center;
                    justify-content: center;
                    height: 100vh;
                    padding: 2rem;
                    background: #f5f7fa;
                    color: #1f2933;
                    font-family: system-ui, sans-serif;
                ">
                    <div style="
                        max-width: 600px;
                        text-align: center;
                    ">
                        <h1 style="color: #c0392b; margin-bottom: 1rem;">
                            "Something went wrong"
                        </h1>
                        <p style="color: #52606d; margin-bottom: 2rem;">
                            "An unexpected error occurred. Please try reloading the page."
                        </p>
                        <details style="
                            text-align: left;
                            background: #e4e7eb;
                            padding: 1rem;
                            border-radius: 4px;
                            margin-bottom: 1rem;
                        ">
                            <summary style="cursor: pointer; color: #52606d;">
                                "Error details"
                            </summary>
                            <ul style="
                                margin: 1rem 0 0 0;
                                padding-left: 1.5rem;
                                color: #c0392b;
                                font-size: 0.9rem;
                            ">
                                {move || errors.get()
                                    .into_iter()
                                    .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                                    .collect::<Vec<_>>()
                                }
                            </ul>
                        </details>
                        <button
                            on:click=move |_| {
                                if let Some(window) = web_sys::window() {
                                    let _ = window.location().reload();
                                }
                            }
                            style="
                                background: #2f80ed;
                                color: white;
                                border: none;
                                padding: 0.75rem 2rem;
                                border-radius: 4px;
                                cursor: pointer;
                                font-size: 1rem;
                            "
                        >
                            "Reload Page"
                        </button>
                    </div>
                </div>
            }
        >
            <AppRouter />
        </ErrorBoundary>
    }
}
