//! Contact Command

use anyhow::Result;
use clap::Args;
use cloudpanel_client::forms::ContactForm;
use cloudpanel_client::Panel;

use crate::output::print_error;

#[derive(Args)]
pub struct ContactArgs {
    /// Your name
    #[arg(short, long)]
    pub name: String,

    /// Address to reply to
    #[arg(short, long)]
    pub email: String,

    #[arg(short, long, default_value = "")]
    pub subject: String,

    /// Message text
    #[arg(short, long)]
    pub message: String,
}

pub async fn execute(args: ContactArgs, panel: &Panel) -> Result<()> {
    let form = ContactForm {
        name: args.name,
        email: args.email,
        subject: args.subject,
        message: args.message,
    };
    match form.parse() {
        Ok(message) => {
            let _ = panel.contact().submit(&message).await;
        }
        Err(e) => print_error(&e.to_string()),
    }
    Ok(())
}
