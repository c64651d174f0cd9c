//! Application router component.
//!
//! Handles URL-based routing with hash history.
//! Uses native hashchange events instead of leptos_router for true hash routing.
//!
//! # Architecture
//!
//! - **URL hash is the source of truth**: `AppContext::route` mirrors `#/...`
//! - **The storage browser follows the route**: folder, versions and archive
//!   toggles are query parameters, so a reload or a shared link restores them
//! - **hashchange events**: Browser back/forward buttons work automatically

use leptos::prelude::*;
use leptos_icons::Icon;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::Closure;

use crate::app::AppContext;
use crate::components::cli::CliConfig;
use crate::components::icons as ic;
use crate::components::storage::DataStorage;
use crate::components::users::UsersPanel;
use crate::config::APP_NAME;
use crate::models::{AppRoute, BrowserRoute};

stylance::import_crate_style!(css, "src/components/router.module.css");

/// Main application router.
///
/// - `#/` → Home (open a storage by id)
/// - `#/storage/{id}?path=..` → Storage browser
/// - `#/cli` → CLI configuration
/// - `#/users` → Users import/export
#[component]
pub fn AppRouter() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let route = ctx.route;

    // Set up hashchange event listener (runs once on mount)
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;
        let closure = Closure::wrap(Box::new(move || {
            let current = AppRoute::current();
            if route.get_untracked() != current {
                route.set(current);
            }
        }) as Box<dyn Fn()>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref());
        }

        // Keep the closure alive for the lifetime of the app
        closure.forget();
    }

    let storage_route = Memo::new(move |_| match route.get() {
        AppRoute::Storage(browser) => Some(browser),
        _ => None,
    });

    view! {
        <div class=css::layout>
            <NavBar route=route />
            <main class=css::content>
                {move || match route.get() {
                    AppRoute::Home => view! { <Home /> }.into_any(),
                    AppRoute::Cli => view! { <CliConfig /> }.into_any(),
                    AppRoute::Users => view! { <UsersPanel /> }.into_any(),
                    // Rendered below so folder changes do not remount the browser
                    AppRoute::Storage(_) => ().into_any(),
                }}
                <Show when=move || storage_route.with(Option::is_some)>
                    <DataStorage route=storage_route />
                </Show>
            </main>
        </div>
    }
}

#[component]
fn NavBar(route: RwSignal<AppRoute>) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let link_class = move |active: bool| {
        if active {
            format!("{} {}", css::navLink, css::navLinkActive)
        } else {
            css::navLink.to_string()
        }
    };

    view! {
        <header class=css::navBar>
            <a class=css::brand href="#/">{APP_NAME}</a>
            <nav class=css::navLinks>
                <a
                    class=move || link_class(matches!(route.get(), AppRoute::Cli))
                    href=AppRoute::Cli.to_hash()
                >
                    <Icon icon=ic::TERMINAL />
                    "CLI"
                </a>
                <a
                    class=move || link_class(matches!(route.get(), AppRoute::Users))
                    href=AppRoute::Users.to_hash()
                >
                    <Icon icon=ic::USERS />
                    "Users"
                </a>
            </nav>
            <span class=css::userName>
                {move || ctx.user.get().map(|u| u.user_name).unwrap_or_default()}
            </span>
        </header>
    }
}

/// Landing view: jump to a storage by id.
#[component]
fn Home() -> impl IntoView {
    let (storage_id, set_storage_id) = signal(String::new());
    let parsed = Memo::new(move |_| storage_id.get().trim().parse::<u64>().ok());

    let open = move || {
        if let Some(id) = parsed.get_untracked() {
            AppRoute::Storage(BrowserRoute::new(id)).push();
        }
    };

    view! {
        <section class=css::home>
            <h1 class=css::homeTitle>{APP_NAME}</h1>
            <form
                class=css::homeForm
                on:submit=move |ev| {
                    ev.prevent_default();
                    open();
                }
            >
                <label class=css::homeLabel for="storage-id">"Storage ID"</label>
                <input
                    id="storage-id"
                    class=css::homeInput
                    inputmode="numeric"
                    prop:value=storage_id
                    on:input=move |ev| set_storage_id.set(event_target_value(&ev))
                />
                <button class=css::homeButton type="submit" disabled=move || parsed.get().is_none()>
                    <Icon icon=ic::FOLDER />
                    "Open"
                </button>
            </form>
        </section>
    }
}
