//! Campaign expansion: a `Campaign` explodes into one `Task` per (user,
//! password) pair, password-major (see spec §4.4 in the design notes):
//! the release instant advances once per password, so every user receives
//! password *p* at the same scheduled instant before password *p+1* is
//! attempted `ScheduleInterval` later. This maximizes the elapsed time
//! between two guesses against the same account.

use chrono::Duration as ChronoDuration;
use trident_types::{Campaign, Task};

/// Expand `campaign` into its constituent tasks. Waves whose release
/// instant would fall after `campaign.not_after` are silently dropped —
/// they could not complete before the campaign's deadline anyway.
pub fn expand_campaign(campaign: &Campaign) -> Vec<Task> {
    let interval = ChronoDuration::from_std(campaign.schedule_interval).unwrap_or(ChronoDuration::MAX);

    let mut tasks = Vec::with_capacity(campaign.passwords.len() * campaign.users.len());
    let mut release_at = campaign.not_before;

    for password in &campaign.passwords {
        for username in &campaign.users {
            tasks.push(Task {
                campaign_id: campaign.id,
                not_before: release_at,
                not_after: campaign.not_after,
                username: username.clone(),
                password: password.clone(),
                provider: campaign.provider.clone(),
                metadata: campaign.provider_metadata.clone(),
            });
        }

        release_at = match release_at.checked_add_signed(interval) {
            Some(t) => t,
            None => break,
        };
        if release_at > campaign.not_after {
            break;
        }
    }

    tasks
}
