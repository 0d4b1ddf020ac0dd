// SPDX-License-Identifier: GPL-3.0-only

//! Cluster-level persistent volume inventory.
//!
//! This inventory is reported for operator visibility only; it never takes
//! part in the stale decision.

use anyhow::{Context, Result};
use async_trait::async_trait;
use csi_types::{Inventory, InventorySource, VolumeId};
use k8s_openapi::api::core::v1::PersistentVolume;
use kube::api::{Api, ListParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config, ResourceExt};
use tracing::{debug, info, warn};

/// Lists the names of all persistent volumes known to the cluster.
#[async_trait]
pub trait PersistentVolumeSource: Send + Sync {
    async fn list_names(&self) -> Result<Vec<String>>;
}

/// Persistent volumes read from the Kubernetes API.
///
/// Credentials are resolved on every call: the in-cluster service account
/// first, then the local kubeconfig.
#[derive(Debug, Default, Clone)]
pub struct KubePersistentVolumes;

impl KubePersistentVolumes {
    async fn client(&self) -> Result<Client> {
        let config = match Config::incluster() {
            Ok(config) => config,
            Err(in_cluster) => {
                debug!("In-cluster config unavailable ({}), trying kubeconfig", in_cluster);
                Config::from_kubeconfig(&KubeConfigOptions::default())
                    .await
                    .context("Failed to load kubeconfig")?
            }
        };
        Client::try_from(config).context("Failed to build Kubernetes client")
    }
}

#[async_trait]
impl PersistentVolumeSource for KubePersistentVolumes {
    async fn list_names(&self) -> Result<Vec<String>> {
        let api: Api<PersistentVolume> = Api::all(self.client().await?);
        let volumes = api
            .list(&ListParams::default())
            .await
            .context("Failed to list PersistentVolumes")?;
        Ok(volumes.items.iter().map(|pv| pv.name_any()).collect())
    }
}

/// Collect the cluster inventory. Never fails: any API problem yields an
/// empty inventory marked unavailable.
pub async fn collect_cluster_volumes(source: &dyn PersistentVolumeSource) -> Inventory {
    info!("Fetching Kubernetes PVs");

    match source.list_names().await {
        Ok(names) => {
            let total = names.len();
            let inventory = Inventory::from_volumes(
                InventorySource::Cluster,
                names.iter().filter_map(|name| VolumeId::from_name(name)),
            );
            debug!(total, matched = inventory.len(), "Listed persistent volumes");
            inventory
        }
        Err(err) => {
            warn!("Failed to talk to the Kubernetes API: {:#}", err);
            warn!("Ensure the ServiceAccount has permission to list persistentvolumes");
            Inventory::unavailable(InventorySource::Cluster, format!("{err:#}"))
        }
    }
}
