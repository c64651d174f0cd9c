//! Storage browser view.
//!
//! The hash route is the source of truth: every route change re-initializes
//! the browser session, which decides whether that means a storage switch, a
//! folder change, a view toggle or a plain refresh.

use leptos::prelude::*;
use leptos_icons::Icon;

use super::{Dialogs, ItemTable, Pagination, Toolbar};
use crate::app::AppContext;
use crate::components::icons as ic;
use crate::core::{ListingPhase, ListingQuery, NoticeKind};
use crate::models::{AppRoute, BrowserRoute};

stylance::import_crate_style!(css, "src/components/storage/storage.module.css");

/// Route of the open storage, shared by the browser components.
#[derive(Clone, Copy)]
pub struct StorageRouteContext(pub Memo<Option<BrowserRoute>>);

impl StorageRouteContext {
    /// Push a route derived from the current one.
    pub fn navigate(&self, change: impl FnOnce(&mut BrowserRoute)) {
        if let Some(mut route) = self.0.get_untracked() {
            change(&mut route);
            AppRoute::Storage(route).push();
        }
    }

    pub fn open_folder(&self, path: Option<&str>) {
        let path = path.map(str::to_string);
        self.navigate(move |route| *route = route.clone().with_path(path));
    }
}

#[component]
pub fn DataStorage(route: Memo<Option<BrowserRoute>>) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    provide_context(StorageRouteContext(route));

    Effect::new(move |_| {
        if let Some(route) = route.get() {
            let query = ListingQuery::from(&route);
            ctx.spawn(move |session| async move { session.initialize(query).await });
        }
    });

    let failure = Memo::new(move |_| {
        ctx.browser(|s| {
            let describe = |e: &crate::core::ApiError| e.to_string();
            match s.listing.phase() {
                ListingPhase::InfoFailed => Some((
                    "Storage is not available",
                    s.listing.info_error().map(describe).unwrap_or_default(),
                )),
                ListingPhase::PageFailed => Some((
                    "Folder could not be listed",
                    s.listing.page_error().map(describe).unwrap_or_default(),
                )),
                _ => None,
            }
        })
    });
    let loading = Memo::new(move |_| {
        ctx.browser(|s| {
            matches!(
                s.listing.phase(),
                ListingPhase::LoadingInfo | ListingPhase::LoadingPage
            )
        })
    });

    view! {
        <section class=css::storage>
            <Toolbar />
            <NoticeBar />
            {move || match failure.get() {
                Some((title, message)) => {
                    view! { <LoadError title=title message=message /> }.into_any()
                }
                None => view! {
                    <div class=css::tableWrap>
                        <Show when=move || loading.get()>
                            <div class=css::loading>"Loading..."</div>
                        </Show>
                        <ItemTable />
                    </div>
                    <Pagination />
                }
                .into_any(),
            }}
            <Dialogs />
        </section>
    }
}

#[component]
fn NoticeBar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let notice = Signal::derive(move || ctx.browser(|s| s.notice.clone()));

    move || {
        notice.get().map(|notice| {
            let class = match notice.kind {
                NoticeKind::Info => format!("{} {}", css::notice, css::noticeInfo),
                NoticeKind::Error => format!("{} {}", css::notice, css::noticeError),
            };
            view! {
                <div class=class role="status">
                    <span>{notice.message}</span>
                    <button
                        class=css::iconButton
                        title="Dismiss"
                        on:click=move |_| ctx.session().dismiss_notice()
                    >
                        <Icon icon=ic::CLOSE />
                    </button>
                </div>
            }
        })
    }
}

#[component]
fn LoadError(title: &'static str, message: String) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let retry = move |_| ctx.spawn(|session| async move { session.reload().await });

    view! {
        <div class=css::loadError role="alert">
            <h3>{title}</h3>
            <p>{message}</p>
            <button class=css::secondaryButton on:click=retry>
                <Icon icon=ic::REFRESH />
                "Retry"
            </button>
        </div>
    }
}
