//! VM Commands

use anyhow::Result;
use clap::Subcommand;
use cloudpanel_client::forms::{VmCreateForm, VmDeleteForm, VmStatusForm};
use cloudpanel_client::Panel;
use cloudpanel_common::VmStatusReport;
use serde::Serialize;
use std::time::Duration;

use crate::output::{print_error, print_info, print_item, print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum VmCommands {
    /// List VMs
    List {
        /// Only show VMs whose name contains this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show VMs with this status ("all" for every status)
        #[arg(long, default_value = "all")]
        status: String,
    },

    /// Show the live status of a VM
    Status {
        /// VM ID
        vmid: String,
    },

    /// Create a new VM
    Create {
        /// VM name
        #[arg(short, long)]
        name: String,

        /// VM ID
        #[arg(long)]
        vmid: String,

        /// Memory in MB
        #[arg(short, long, default_value = "2048")]
        memory: String,

        /// Number of cores
        #[arg(short, long, default_value = "2")]
        cores: String,

        /// Storage size
        #[arg(long, default_value = "20G")]
        storage: String,

        /// Installation ISO
        #[arg(long, default_value = "")]
        iso: String,

        /// Network bridge
        #[arg(long, default_value = "vmbr0")]
        network: String,

        /// UPI ID to pay from
        #[arg(long)]
        upi_id: String,

        /// Amount in INR
        #[arg(long)]
        amount: String,
    },

    /// Delete a VM
    Delete {
        /// VM ID
        vmid: String,

        /// UPI ID to pay from
        #[arg(long)]
        upi_id: String,

        /// Amount in INR
        #[arg(long)]
        amount: String,
    },

    /// Keep the VM list and statuses up to date until interrupted
    Watch {
        /// Only show VMs whose name contains this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show VMs with this status ("all" for every status)
        #[arg(long, default_value = "all")]
        status: String,
    },
}

/// VM status display wrapper for serialization
#[derive(Serialize)]
pub struct StatusDisplay {
    #[serde(flatten)]
    report: VmStatusReport,
}

impl TableDisplay for StatusDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Status", "Memory", "CPU"]
    }

    fn row(&self) -> Vec<String> {
        self.report
            .lines()
            .into_iter()
            .map(|line| match line.split_once(": ") {
                Some((_, value)) => value.to_string(),
                None => line,
            })
            .collect()
    }
}

fn show_list(panel: &Panel, search: &str, status: &str, format: OutputFormat) {
    let entries = panel.vms().view().filter(search, status);
    print_list(&entries, format);
}

pub async fn execute(cmd: VmCommands, panel: &Panel, format: OutputFormat) -> Result<()> {
    match cmd {
        VmCommands::List { search, status } => {
            if panel.vms().list().await.is_ok() {
                show_list(panel, &search, &status, format);
            }
        }

        VmCommands::Status { vmid } => {
            let vmid = match (VmStatusForm { vmid }).parse() {
                Ok(vmid) => vmid,
                Err(e) => {
                    print_error(&e.to_string());
                    return Ok(());
                }
            };
            if let Ok(report) = panel.vms().get_status(vmid).await {
                print_item(&StatusDisplay { report }, format);
            }
        }

        VmCommands::Create {
            name,
            vmid,
            memory,
            cores,
            storage,
            iso,
            network,
            upi_id,
            amount,
        } => {
            let form = VmCreateForm {
                name,
                vmid,
                memory,
                cores,
                storage,
                iso,
                network,
                upi_id,
                amount,
            };
            let request = match form.parse() {
                Ok(request) => request,
                Err(e) => {
                    print_error(&e.to_string());
                    return Ok(());
                }
            };
            if panel.vms().create(request).await.is_ok() {
                show_list(panel, "", "all", format);
            }
        }

        VmCommands::Delete {
            vmid,
            upi_id,
            amount,
        } => {
            let form = VmDeleteForm {
                vmid,
                upi_id,
                amount,
            };
            let (vmid, payment) = match form.parse() {
                Ok(parsed) => parsed,
                Err(e) => {
                    print_error(&e.to_string());
                    return Ok(());
                }
            };
            if panel.vms().delete(u64::from(vmid), &payment).await.is_ok() {
                show_list(panel, "", "all", format);
            }
        }

        VmCommands::Watch { search, status } => watch(panel, &search, &status, format).await?,
    }

    Ok(())
}

/// Re-render whenever a refresh lands; Ctrl-C stops
async fn watch(panel: &Panel, search: &str, status: &str, format: OutputFormat) -> Result<()> {
    let _ = panel.vms().list().await;
    let view = panel.vms().view().clone();
    show_list(panel, search, status, format);

    let lists = panel.poll_vms();
    let statuses = panel.poll_vm_statuses();
    print_info(&format!(
        "Refreshing every {}s, press Ctrl-C to stop",
        panel.config().poll_interval().as_secs()
    ));

    let mut shown = (view.revision(), view.entries());
    let mut redraw = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = redraw.tick() => {
                let current = (view.revision(), view.entries());
                if current != shown {
                    show_list(panel, search, status, format);
                    shown = current;
                }
            }
        }
    }

    lists.stop().await;
    statuses.stop().await;
    Ok(())
}
