//! Service Commands

use anyhow::Result;
use clap::Subcommand;
use cloudpanel_client::forms::{ServiceCreateForm, ServiceDeleteForm, ServiceUpdateForm};
use cloudpanel_client::Panel;

use crate::output::{print_error, print_list, OutputFormat};

#[derive(Subcommand)]
pub enum ServiceCommands {
    /// List service offerings
    List {
        /// Only show services whose name contains this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show services with this status ("all" for every status)
        #[arg(long, default_value = "all")]
        status: String,
    },

    /// Create a service offering
    Create {
        /// Service name
        #[arg(short, long)]
        name: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Price in INR
        #[arg(short, long)]
        price: String,

        /// Comma separated feature list
        #[arg(short, long, default_value = "")]
        features: String,

        /// UPI ID to pay from
        #[arg(long)]
        upi_id: String,

        /// Amount in INR
        #[arg(long)]
        amount: String,
    },

    /// Change fields of a service offering; omitted fields stay as they are
    Update {
        /// Service ID
        id: String,

        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, default_value = "")]
        price: String,

        /// Comma separated feature list
        #[arg(short, long, default_value = "")]
        features: String,
    },

    /// Delete a service offering
    Delete {
        /// Service ID
        id: String,

        /// UPI ID to pay from
        #[arg(long)]
        upi_id: String,

        /// Amount in INR
        #[arg(long)]
        amount: String,
    },
}

fn show_list(panel: &Panel, search: &str, status: &str, format: OutputFormat) {
    print_list(&panel.services().view().filter(search, status), format);
}

pub async fn execute(cmd: ServiceCommands, panel: &Panel, format: OutputFormat) -> Result<()> {
    let services = panel.services();

    match cmd {
        ServiceCommands::List { search, status } => {
            if services.list().await.is_ok() {
                show_list(panel, &search, &status, format);
            }
        }

        ServiceCommands::Create {
            name,
            description,
            price,
            features,
            upi_id,
            amount,
        } => {
            let form = ServiceCreateForm {
                name,
                description,
                price,
                features,
                upi_id,
                amount,
            };
            match form.parse() {
                Ok(request) => {
                    if services.create(request).await.is_ok() {
                        show_list(panel, "", "all", format);
                    }
                }
                Err(e) => print_error(&e.to_string()),
            }
        }

        ServiceCommands::Update {
            id,
            name,
            description,
            price,
            features,
        } => {
            let form = ServiceUpdateForm {
                id,
                name,
                description,
                price,
                features,
            };
            match form.parse() {
                Ok((id, patch)) => {
                    if services.update(id, &patch).await.is_ok() {
                        show_list(panel, "", "all", format);
                    }
                }
                Err(e) => print_error(&e.to_string()),
            }
        }

        ServiceCommands::Delete { id, upi_id, amount } => {
            let form = ServiceDeleteForm { id, upi_id, amount };
            match form.parse() {
                Ok((id, payment)) => {
                    if services.delete(id, &payment).await.is_ok() {
                        show_list(panel, "", "all", format);
                    }
                }
                Err(e) => print_error(&e.to_string()),
            }
        }
    }

    Ok(())
}
