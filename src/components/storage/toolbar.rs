//! Browser toolbar: breadcrumbs, view toggles and actions on the selection.

use leptos::prelude::*;
use leptos_icons::Icon;

use super::StorageRouteContext;
use crate::app::AppContext;
use crate::components::icons as ic;
use crate::components::widgets::RegionTag;
use crate::core::selectors;
use crate::models::{BrowserDialog, BrowserRoute, StorageInfo};

stylance::import_crate_style!(css, "src/components/storage/storage.module.css");

/// One clickable breadcrumb: label and the folder it opens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub path: Option<String>,
}

/// Breadcrumbs from the storage root down to the open folder.
pub fn breadcrumbs(root_label: &str, path: Option<&str>) -> Vec<Crumb> {
    let mut crumbs = vec![Crumb {
        label: root_label.to_string(),
        path: None,
    }];
    let mut prefix = String::new();
    for segment in path.unwrap_or("").split('/').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        crumbs.push(Crumb {
            label: segment.to_string(),
            path: Some(prefix.clone()),
        });
    }
    crumbs
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct BulkState {
    selected: usize,
    download: bool,
    delete: bool,
    restore: bool,
}

#[component]
pub fn Toolbar() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let nav = use_context::<StorageRouteContext>().expect("StorageRouteContext must be provided");

    let info = Memo::new(move |_| ctx.browser(|s| s.listing.info().cloned()));
    let access = Memo::new(move |_| ctx.capabilities(|_, c| c.access));
    let bulk = Memo::new(move |_| {
        ctx.capabilities(|listing, c| BulkState {
            selected: listing.selection().len(),
            download: selectors::bulk_download_enabled(listing, c),
            delete: selectors::bulk_delete_enabled(listing, c),
            restore: selectors::bulk_restore_enabled(listing, c),
        })
    });
    let route = Signal::derive(move || nav.0.get().unwrap_or_default());

    let crumbs = Memo::new(move |_| {
        let route = route.get();
        let root = info
            .get()
            .map(|i| i.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Storage {}", route.storage_id));
        breadcrumbs(&root, route.path.as_deref())
    });

    let can_write = Signal::derive(move || access.get().write);
    let versioned = Signal::derive(move || info.get().is_some_and(|i| i.is_versioned()));
    let object_storage = Signal::derive(move || info.get().is_some_and(|i| !i.is_file_share()));
    let convertible = Signal::derive(move || {
        can_write.get() && info.get().is_some_and(|i| i.can_convert_to_versioned())
    });

    let refresh = move |_| ctx.spawn(|session| async move { session.refresh(true).await });

    let open = move |dialog: BrowserDialog| ctx.session().open_dialog(dialog);

    let download_selected = move |_| {
        let now = ctx.now();
        ctx.spawn(move |session| async move { session.download_selected(&now).await });
    };

    let delete_selected = move |_| {
        let items = ctx.browser_untracked(|s| {
            s.listing
                .selected_items()
                .into_iter()
                .map(|item| item.key())
                .collect()
        });
        ctx.session().open_dialog(BrowserDialog::DeleteConfirmation {
            items,
            totally: false,
        });
    };

    let restore_selected = move |_| {
        let paths = ctx.browser_untracked(|s| {
            s.listing
                .selected_items()
                .into_iter()
                .map(|item| item.path.clone())
                .collect()
        });
        ctx.session()
            .open_dialog(BrowserDialog::LifecycleRestore { paths });
    };

    let toggle = move |change: fn(&mut BrowserRoute)| nav.navigate(change);

    view! {
        <div class=css::toolbar>
            <nav class=css::breadcrumbs aria-label="Folder path">
                <For
                    each=move || crumbs.get()
                    key=|crumb| crumb.path.clone()
                    children=move |crumb| {
                        let path = crumb.path.clone();
                        view! {
                            <span class=css::crumbSeparator>"/"</span>
                            <button
                                class=css::crumb
                                on:click=move |_| nav.open_folder(path.as_deref())
                            >
                                {crumb.label}
                            </button>
                        }
                    }
                />
                {move || info.get().map(|info: StorageInfo| view! { <RegionTag info=info /> })}
            </nav>

            <div class=css::actions>
                <button class=css::toolButton title="Refresh" on:click=refresh>
                    <Icon icon=ic::REFRESH />
                </button>
                <button
                    class=css::toolButton
                    disabled=move || !can_write.get()
                    on:click=move |_| open(BrowserDialog::CreateFolder)
                >
                    <Icon icon=ic::FOLDER_PLUS />
                    "Folder"
                </button>
                <button
                    class=css::toolButton
                    disabled=move || !can_write.get()
                    on:click=move |_| open(BrowserDialog::CreateFile)
                >
                    <Icon icon=ic::FILE_PLUS />
                    "File"
                </button>

                <Show when=move || versioned.get() && can_write.get()>
                    <label class=css::toggle>
                        <input
                            type="checkbox"
                            prop:checked=move || route.get().versions
                            on:change=move |_| toggle(|r| r.versions = !r.versions)
                        />
                        <Icon icon=ic::VERSIONS />
                        "Show versions"
                    </label>
                </Show>
                <Show when=move || object_storage.get()>
                    <label class=css::toggle>
                        <input
                            type="checkbox"
                            prop:checked=move || route.get().archives
                            on:change=move |_| toggle(|r| r.archives = !r.archives)
                        />
                        <Icon icon=ic::ARCHIVE />
                        "Show archived"
                    </label>
                </Show>
                <Show when=move || convertible.get()>
                    <button
                        class=css::toolButton
                        on:click=move |_| open(BrowserDialog::ConvertToVersioned)
                    >
                        <Icon icon=ic::VERSIONS />
                        "Enable versioning"
                    </button>
                </Show>
            </div>

            <Show when=move || { bulk.get().selected > 0 }>
                <div class=css::bulkBar>
                    <span class=css::bulkCount>
                        {move || format!("{} selected", bulk.get().selected)}
                    </span>
                    <button
                        class=css::toolButton
                        disabled=move || !bulk.get().download
                        on:click=download_selected
                    >
                        <Icon icon=ic::DOWNLOAD />
                        "Download"
                    </button>
                    <button
                        class=css::toolButton
                        disabled=move || !bulk.get().delete
                        on:click=delete_selected
                    >
                        <Icon icon=ic::TRASH />
                        "Delete"
                    </button>
                    <Show when=move || bulk.get().restore>
                        <button class=css::toolButton on:click=restore_selected>
                            <Icon icon=ic::RESTORE />
                            "Restore"
                        </button>
                    </Show>
                    <button
                        class=css::toolButton
                        on:click=move |_| ctx.session().clear_selection()
                    >
                        <Icon icon=ic::CLOSE />
                        "Clear"
                    </button>
                </div>
            </Show>
        </div>
    }
}
