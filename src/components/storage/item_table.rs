//! Table of the visible page.
//!
//! Rows are keyed by path, version and whether they are the latest version;
//! each row re-reads its own entry so selection and capability changes only
//! redraw the rows they touch.

use icondata::Icon as IconData;
use leptos::prelude::*;
use leptos_icons::Icon;

use super::StorageRouteContext;
use crate::app::AppContext;
use crate::components::icons as ic;
use crate::core::restore::RestoreStatus;
use crate::core::selectors::{self, ItemRow};
use crate::core::Notice;
use crate::models::BrowserDialog;
use crate::utils::dom::open_url;
use crate::utils::{format_changed, format_size};

stylance::import_crate_style!(css, "src/components/storage/storage.module.css");

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RowId {
    path: String,
    version: Option<String>,
    latest: bool,
}

impl RowId {
    fn of(row: &ItemRow) -> Self {
        Self {
            path: row.item.path.clone(),
            version: row.item.version.clone(),
            latest: row.latest,
        }
    }

    fn matches(&self, row: &ItemRow) -> bool {
        row.latest == self.latest && row.item.path == self.path && row.item.version == self.version
    }
}

/// Badge shown next to the type icon.
fn restore_badge(row: &ItemRow) -> Option<(IconData, &'static str)> {
    match row.restore {
        Some(status) if status.is_in_progress() => Some((ic::CLOCK, "Restore in progress")),
        Some(RestoreStatus::Succeeded) if row.item.is_archived() && !row.capabilities.archived => {
            Some((ic::RESTORE, "Restored"))
        }
        _ if row.capabilities.archived => Some((ic::ARCHIVE, "Archived")),
        _ => None,
    }
}

#[component]
pub fn ItemTable() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");

    let rows = Memo::new(move |_| ctx.capabilities(selectors::table_rows));
    let ids = Memo::new(move |_| rows.with(|rows| rows.iter().map(RowId::of).collect::<Vec<_>>()));

    let all_selected = Memo::new(move |_| {
        rows.with(|rows| {
            let mut selectable = rows
                .iter()
                .filter(|r| r.latest && r.capabilities.selectable)
                .peekable();
            selectable.peek().is_some() && selectable.all(|r| r.selected)
        })
    });

    let toggle_all = move |_| {
        if all_selected.get_untracked() {
            ctx.session().clear_selection();
        } else {
            ctx.session().select_all(&ctx.now());
        }
    };

    view! {
        <table class=css::table>
            <thead>
                <tr>
                    <th class=css::colCheck>
                        <input
                            type="checkbox"
                            aria-label="Select all"
                            prop:checked=move || all_selected.get()
                            on:change=toggle_all
                        />
                    </th>
                    <th class=css::colIcon></th>
                    <th>"Name"</th>
                    <th class=css::colSize>"Size"</th>
                    <th class=css::colChanged>"Changed"</th>
                    <th>"Labels"</th>
                    <th class=css::colActions></th>
                </tr>
            </thead>
            <tbody>
                <For
                    each=move || ids.get()
                    key=|id| id.clone()
                    children=move |id| {
                        let row = Memo::new(move |_| {
                            rows.with(|rows| rows.iter().find(|r| id.matches(r)).cloned())
                        });
                        move || row.get().map(|row| view! { <TableRow row=row /> })
                    }
                />
                <Show when=move || ids.with(Vec::is_empty)>
                    <tr>
                        <td class=css::empty colspan="7">"This folder is empty"</td>
                    </tr>
                </Show>
            </tbody>
        </table>
    }
}

#[component]
fn TableRow(row: ItemRow) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext must be provided");
    let nav = use_context::<StorageRouteContext>().expect("StorageRouteContext must be provided");

    let caps = row.capabilities;
    let latest = row.latest;
    let key = row.item.key();
    let path = row.item.path.clone();
    let version = row.item.version.clone();
    let is_folder = row.item.is_folder();
    let badge = restore_badge(&row);

    let row_class = match (latest, row.item.delete_marker) {
        (_, true) => format!("{} {}", css::row, css::rowDeleted),
        (false, false) => format!("{} {}", css::row, css::rowVersion),
        (true, false) => css::row.to_string(),
    };

    let name_cell = if is_folder {
        let target = path.clone();
        view! {
            <button class=css::folderLink on:click=move |_| nav.open_folder(Some(&target))>
                {row.item.name.clone()}
            </button>
        }
        .into_any()
    } else if latest {
        view! { <span>{row.item.name.clone()}</span> }.into_any()
    } else {
        let label = version.clone().unwrap_or_default();
        view! { <span class=css::versionLabel>{label}</span> }.into_any()
    };

    let labels = row
        .item
        .labels
        .iter()
        .map(|(k, v)| view! { <span class=css::label>{format!("{k}: {v}")}</span> })
        .collect_view();

    let download = {
        let path = path.clone();
        let version = version.clone();
        move |_| {
            let path = path.clone();
            let version = version.clone();
            ctx.spawn(move |session| async move {
                match session.download_url(&path, version.as_deref()).await {
                    Ok(link) => open_url(&link.url),
                    Err(error) => {
                        tracing::warn!(%error, path = %path, "download link failed");
                        session.notify(Notice::error(error.to_string()));
                    }
                }
            });
        }
    };

    let edit_tags = {
        let path = path.clone();
        let version = version.clone();
        move |_| {
            ctx.session().open_dialog(BrowserDialog::EditTags {
                path: path.clone(),
                version: version.clone(),
            })
        }
    };

    let rename = {
        let key = key.clone();
        move |_| {
            ctx.session()
                .open_dialog(BrowserDialog::Rename { item: key.clone() })
        }
    };

    let lifecycle_restore = {
        let path = path.clone();
        move |_| {
            ctx.session().open_dialog(BrowserDialog::LifecycleRestore {
                paths: vec![path.clone()],
            })
        }
    };

    let delete = {
        let key = key.clone();
        move |_| {
            ctx.session().open_dialog(BrowserDialog::DeleteConfirmation {
                items: vec![key.clone()],
                totally: false,
            })
        }
    };

    let restore_version = {
        let path = path.clone();
        let version = version.clone();
        move |_| {
            let path = path.clone();
            let Some(version) = version.clone() else { return };
            ctx.spawn(move |session| async move { session.restore_version(&path, &version).await });
        }
    };

    let delete_version = {
        let path = path.clone();
        let version = version.clone();
        move |_| {
            let path = path.clone();
            let Some(version) = version.clone() else { return };
            ctx.spawn(move |session| async move { session.delete_version(&path, &version).await });
        }
    };

    let versioned_row = !latest && version.is_some();

    view! {
        <tr class=row_class>
            <td class=css::colCheck>
                {latest.then(|| {
                    let key = key.clone();
                    view! {
                        <input
                            type="checkbox"
                            aria-label="Select"
                            disabled=!caps.selectable
                            prop:checked=row.selected
                            on:change=move |_| ctx.session().toggle_selection(key.clone())
                        />
                    }
                })}
            </td>
            <td class=css::colIcon>
                <Icon icon={if is_folder { ic::FOLDER } else { ic::FILE }} />
                {badge.map(|(icon, title)| view! {
                    <span class=css::badge title=title>
                        <Icon icon=icon />
                    </span>
                })}
            </td>
            <td class=css::colName>{name_cell}</td>
            <td class=css::colSize>{if is_folder { String::new() } else { format_size(row.item.size) }}</td>
            <td class=css::colChanged>{format_changed(row.item.changed.as_deref())}</td>
            <td class=css::colLabels>{labels}</td>
            <td class=css::colActions>
                {caps.downloadable.then(|| view! {
                    <button class=css::iconButton title="Download" on:click=download>
                        <Icon icon=ic::DOWNLOAD />
                    </button>
                })}
                {(caps.editable && !is_folder).then(|| view! {
                    <button class=css::iconButton title="Tags" on:click=edit_tags>
                        <Icon icon=ic::TAG />
                    </button>
                })}
                {(caps.editable && latest).then(|| view! {
                    <button class=css::iconButton title="Rename" on:click=rename>
                        <Icon icon=ic::EDIT />
                    </button>
                })}
                {(caps.archived && caps.deletable && latest).then(|| view! {
                    <button class=css::iconButton title="Restore from archive" on:click=lifecycle_restore>
                        <Icon icon=ic::RESTORE />
                    </button>
                })}
                {(caps.deletable && latest).then(|| view! {
                    <button class=css::iconButton title="Delete" on:click=delete>
                        <Icon icon=ic::TRASH />
                    </button>
                })}
                {(versioned_row && caps.deletable).then(|| view! {
                    <button class=css::iconButton title="Make this version latest" on:click=restore_version>
                        <Icon icon=ic::VERSIONS />
                    </button>
                    <button class=css::iconButton title="Delete version" on:click=delete_version>
                        <Icon icon=ic::TRASH />
                    </button>
                })}
            </td>
        </tr>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selectors::ItemCapabilities;
    use crate::models::{ItemType, STORAGE_CLASS_LABEL, StorageItem};

    fn row(storage_class: Option<&str>, archived: bool, restore: Option<RestoreStatus>) -> ItemRow {
        let mut item = StorageItem::new("data/a.bin", ItemType::File);
        if let Some(class) = storage_class {
            item.labels
                .insert(STORAGE_CLASS_LABEL.to_string(), class.to_string());
        }
        ItemRow {
            item,
            latest: true,
            selected: false,
            capabilities: ItemCapabilities {
                archived,
                ..Default::default()
            },
            restore,
        }
    }

    #[test]
    fn test_restore_badge() {
        assert!(restore_badge(&row(None, false, None)).is_none());

        let (_, title) = restore_badge(&row(Some("GLACIER"), true, None)).unwrap();
        assert_eq!(title, "Archived");

        let (_, title) =
            restore_badge(&row(Some("GLACIER"), true, Some(RestoreStatus::Running))).unwrap();
        assert_eq!(title, "Restore in progress");

        let (_, title) =
            restore_badge(&row(Some("GLACIER"), false, Some(RestoreStatus::Succeeded))).unwrap();
        assert_eq!(title, "Restored");
    }

    #[test]
    fn test_row_id_separates_versions() {
        let latest = row(None, false, None);
        let mut older = latest.clone();
        older.latest = false;
        older.item.version = Some("v1".into());

        let id = RowId::of(&latest);
        assert!(id.matches(&latest));
        assert!(!id.matches(&older));
        assert!(RowId::of(&older).matches(&older));
    }
}
