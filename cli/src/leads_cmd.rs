use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::ArgGroup;
use clap::Args;
use leaddesk_backend_client::HttpRecordStore;
use leaddesk_core::Applied;
use leaddesk_core::LeadListController;
use leaddesk_core::LeaddeskConfig;
use leaddesk_core::Reconciled;
use leaddesk_core::SavedViews;
use leaddesk_core::SessionContext;
use leaddesk_core::address;
use leaddesk_core::find_leaddesk_home;
use leaddesk_protocol::LeadId;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::address_cmd::parse_update;
use crate::output::print_notices;
use crate::output::print_page;
use crate::parse_key_value;
use crate::patch_args::PatchArgs;

/// Resolved home directory, configuration, and unit for one invocation.
pub struct Workspace {
    home: PathBuf,
    config: LeaddeskConfig,
    unit_id: String,
    views: SavedViews,
}

impl Workspace {
    pub fn open(config_home: Option<PathBuf>, unit: Option<String>) -> Result<Self> {
        let home = find_leaddesk_home(config_home.as_deref())?;
        let config = LeaddeskConfig::load(&home)
            .with_context(|| format!("failed to load configuration from {}", home.display()))?;
        if config.operator_id.trim().is_empty() {
            bail!(
                "operator_id is not set; add it to {}",
                home.join(leaddesk_core::config::CONFIG_FILE).display()
            );
        }
        let Some(unit_id) = unit.or_else(|| config.unit_id.clone()) else {
            bail!("no unit selected; pass --unit or set unit_id in config.toml");
        };
        let views = SavedViews::load(&home)?;
        Ok(Self {
            home,
            config,
            unit_id,
            views,
        })
    }

    fn controller(&self) -> Result<LeadListController> {
        let session = SessionContext::new(
            self.config.operator_id.clone(),
            self.config.api_token.clone(),
        );
        let store = HttpRecordStore::new(&self.config, session.clone())?;
        Ok(LeadListController::new(
            Arc::new(store),
            session,
            self.unit_id.clone(),
            self.config.select_chunk_size,
        ))
    }

    /// `explicit` when given, else the last view saved for the unit.
    fn start_address(&self, explicit: Option<&str>) -> String {
        explicit
            .or_else(|| self.views.get(&self.unit_id))
            .unwrap_or_default()
            .to_string()
    }

    /// Builds a controller showing `address` and loads its page.
    async fn open_view(&self, address: &str) -> Result<LeadListController> {
        let mut controller = self.controller()?;
        let applied = match controller.navigate(address) {
            Some(request) => {
                let completion = controller.fetcher().fetch(request).await;
                controller.complete_fetch(completion)
            }
            None => controller.reload().await,
        };
        if let Applied::Failed(err) = applied {
            print_notices(controller.drain_notices());
            return Err(err).context("failed to load leads");
        }
        Ok(controller)
    }

    fn remember(&mut self, address: &str) -> Result<()> {
        self.views.set(&self.unit_id, address);
        let path = self.views.save(&self.home)?;
        debug!(path = %path.display(), "saved view");
        Ok(())
    }
}

/// Cancelled when the operator presses Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let guard = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            guard.cancel();
        }
    });
    token
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Address of the view to show. Defaults to the last view of the unit.
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Edit the view before showing it. An empty value clears the key.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Print the page as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub async fn run(self, mut workspace: Workspace) -> Result<()> {
        let mut target = workspace.start_address(self.address.as_deref());
        if !self.set.is_empty() {
            target = address::merge(&target, &parse_update(&self.set)?);
        }
        let mut controller = workspace.open_view(&target).await?;
        print_notices(controller.drain_notices());
        print_page(&controller, self.json)?;
        workspace.remember(controller.address())?;
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct SelectAllArgs {
    /// Address of the view. Defaults to the last view of the unit.
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,
}

impl SelectAllArgs {
    pub async fn run(self, workspace: Workspace) -> Result<()> {
        let target = workspace.start_address(self.address.as_deref());
        let mut controller = workspace.controller()?;
        controller.set_address(&target);
        let result = controller.select_matching(&interrupt_token()).await;
        print_notices(controller.drain_notices());
        result?;
        for id in controller.selection().ids() {
            println!("{id}");
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Lead to patch.
    pub id: LeadId,

    /// View the lead is edited from; decides whether it stays listed.
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,

    #[command(flatten)]
    pub patch: PatchArgs,
}

impl UpdateArgs {
    pub async fn run(self, workspace: Workspace) -> Result<()> {
        let target = workspace.start_address(self.address.as_deref());
        let mut controller = workspace.open_view(&target).await?;
        let result = controller.update_lead(&self.id, &self.patch.to_patch()).await;
        print_notices(controller.drain_notices());
        match result? {
            Reconciled::Removed => {
                println!("Updated {}; it no longer matches this view.", self.id);
            }
            Reconciled::Replaced | Reconciled::NotOnPage => println!("Updated {}.", self.id),
        }
        Ok(())
    }
}

/// Which leads a bulk command targets.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("targets")
        .args(["ids", "matching"])
        .required(true)
        .multiple(false)
))]
pub struct BulkTargetArgs {
    /// Comma-separated lead ids.
    #[arg(long, value_name = "ID,...", value_delimiter = ',')]
    pub ids: Vec<LeadId>,

    /// Every lead matching the view, across all pages.
    #[arg(long)]
    pub matching: bool,

    /// Address of the view. Defaults to the last view of the unit.
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,
}

impl BulkTargetArgs {
    /// Opens the view and fills the controller's selection.
    async fn select(&self, workspace: &Workspace) -> Result<LeadListController> {
        let target = workspace.start_address(self.address.as_deref());
        let mut controller = workspace.open_view(&target).await?;
        if self.matching {
            let result = controller.select_matching(&interrupt_token()).await;
            if let Err(err) = result {
                print_notices(controller.drain_notices());
                return Err(err.into());
            }
        } else {
            controller.selection_mut().select_all(&self.ids);
        }
        Ok(controller)
    }
}

#[derive(Debug, Args)]
pub struct BulkUpdateArgs {
    #[command(flatten)]
    pub targets: BulkTargetArgs,

    #[command(flatten)]
    pub patch: PatchArgs,
}

impl BulkUpdateArgs {
    pub async fn run(self, workspace: Workspace) -> Result<()> {
        let mut controller = self.targets.select(&workspace).await?;
        let result = controller.bulk_update(&self.patch.to_patch()).await;
        print_notices(controller.drain_notices());
        result?;
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct BulkDeleteArgs {
    #[command(flatten)]
    pub targets: BulkTargetArgs,
}

impl BulkDeleteArgs {
    pub async fn run(self, workspace: Workspace) -> Result<()> {
        let mut controller = self.targets.select(&workspace).await?;
        let result = controller.bulk_delete().await;
        print_notices(controller.drain_notices());
        result?;
        Ok(())
    }
}
