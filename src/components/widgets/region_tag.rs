//! Cloud provider and region badge of a storage.

use leptos::prelude::*;
use leptos_icons::Icon;

use crate::components::icons as ic;
use crate::models::{StorageInfo, StorageType};

stylance::import_crate_style!(css, "src/components/widgets/widgets.module.css");

pub fn provider_label(storage_type: StorageType) -> &'static str {
    match storage_type {
        StorageType::S3 => "AWS",
        StorageType::Az => "Azure",
        StorageType::Gs => "GCP",
        StorageType::Nfs => "NFS",
    }
}

/// `AWS · region 3`; file shares and storages without a region show only
/// the provider.
pub fn region_label(info: &StorageInfo) -> String {
    let provider = provider_label(info.storage_type);
    match info.region_id {
        Some(region) if !info.is_file_share() => format!("{provider} · region {region}"),
        _ => provider.to_string(),
    }
}

#[component]
pub fn RegionTag(info: StorageInfo) -> impl IntoView {
    let label = region_label(&info);
    view! {
        <span class=css::regionTag title="Cloud region">
            <Icon icon=ic::REGION />
            {label}
        </span>
    }
}
