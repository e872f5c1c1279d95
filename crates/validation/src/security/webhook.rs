//! Per-environment webhook URL policy.
//!
//! Rules run in a fixed order and the first failure wins: the two targets
//! must differ, the production host must not be private, production must use
//! https, and development must use https unless it points at `localhost`.

use url::Url;

use crate::types::{SecurityRule, SecurityViolation};
use crate::utils::is_private_host;

fn host(url: &Url) -> &str {
    url.host_str().unwrap_or_default()
}

pub fn check_distinct_targets(dev: &Url, prod: &Url) -> Result<(), SecurityViolation> {
    if dev == prod {
        return Err(SecurityViolation::new(
            SecurityRule::WebhookUrlConflict,
            "Development and production webhook URLs must be different",
        ));
    }
    Ok(())
}

pub fn check_prod_webhook(prod: &Url) -> Result<(), SecurityViolation> {
    if is_private_host(host(prod)) {
        return Err(SecurityViolation::new(
            SecurityRule::PrivateWebhookHost,
            "Production webhook URLs cannot use private IP addresses",
        ));
    }
    if prod.scheme() != "https" {
        return Err(SecurityViolation::new(
            SecurityRule::InsecureProdWebhook,
            "Production webhook URL must use HTTPS",
        ));
    }
    Ok(())
}

pub fn check_dev_webhook(dev: &Url) -> Result<(), SecurityViolation> {
    if dev.scheme() != "https" && host(dev) != "localhost" {
        return Err(SecurityViolation::new(
            SecurityRule::InsecureDevWebhook,
            "Webhook URL must use HTTPS or be localhost",
        ));
    }
    Ok(())
}

/// Apply every rule whose inputs are present
pub fn check_webhook_urls(dev: Option<&Url>, prod: Option<&Url>) -> Result<(), SecurityViolation> {
    if let (Some(dev), Some(prod)) = (dev, prod) {
        check_distinct_targets(dev, prod)?;
    }
    if let Some(prod) = prod {
        check_prod_webhook(prod)?;
    }
    if let Some(dev) = dev {
        check_dev_webhook(dev)?;
    }
    Ok(())
}
