//! Marker-based page navigation.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::app::AppContext;
use crate::components::icons as ic;
use crate::core::selectors;

stylance::import_crate_style!(css, "src/components/storage/storage.module.css");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PageState {
    current: usize,
    previous: bool,
    next: bool,
}

#[component]
pub fn Pagination() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let state = Memo::new(move |_| {
        ctx.browser(|s| PageState {
            current: s.listing.current_page(),
            previous: selectors::can_go_previous(&s.listing),
            next: selectors::can_go_next(&s.listing),
        })
    });

    view! {
        <Show when=move || { state.get().previous || state.get().next }>
            <div class=css::pagination>
                <button
                    class=css::iconButton
                    title="First page"
                    disabled=move || !state.get().previous
                    on:click=move |_| ctx.spawn(|session| async move { session.first_page().await })
                >
                    <Icon icon=ic::FIRST_PAGE />
                </button>
                <button
                    class=css::iconButton
                    title="Previous page"
                    disabled=move || !state.get().previous
                    on:click=move |_| ctx.spawn(|session| async move { session.previous_page().await })
                >
                    <Icon icon=ic::CHEVRON_LEFT />
                </button>
                <span class=css::pageNumber>{move || format!("Page {}", state.get().current + 1)}</span>
                <button
                    class=css::iconButton
                    title="Next page"
                    disabled=move || !state.get().next
                    on:click=move |_| ctx.spawn(|session| async move { session.next_page().await })
                >
                    <Icon icon=ic::CHEVRON_RIGHT />
                </button>
            </div>
        </Show>
    }
}
