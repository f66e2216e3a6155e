//! Per-sender statistics and mailbox triage summaries.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use mailsweep_jmap::methods::email::{self, Comparator, Email, Filter};
use mailsweep_jmap::{Request, ResultReference};

use crate::client::{expect_email_get, Client, Exchange};
use crate::email::{build_filter, header_value};
use crate::error::Result;
use crate::types::{DomainBreakdown, SenderBreakdown, SenderCount, TriageSummary};

/// Page size used when walking a mailbox for aggregation.
const PAGE_SIZE: u64 = 500;

/// Options for [`Client::aggregate_by_sender`].
#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Mailbox reference (role, name, or id); `None` walks all mail.
    pub mailbox: Option<String>,
    /// Only count unread emails.
    pub unread_only: bool,
    /// Only count flagged emails.
    pub flagged_only: bool,
    /// Only count unflagged emails.
    pub unflagged_only: bool,
    /// Collect distinct subject lines per sender.
    pub subjects: bool,
    /// Number of senders to report.
    pub top: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            mailbox: None,
            unread_only: false,
            flagged_only: false,
            unflagged_only: false,
            subjects: false,
            top: 20,
        }
    }
}

/// Options for [`Client::summary`].
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Mailbox reference (role, name, or id); `None` walks all mail.
    pub mailbox: Option<String>,
    /// Only count unread emails.
    pub unread_only: bool,
    /// Only count flagged emails.
    pub flagged_only: bool,
    /// Only count unflagged emails.
    pub unflagged_only: bool,
    /// Number of top senders and domains to report.
    pub limit: usize,
    /// Collect sample subject lines per sender.
    pub subjects: bool,
    /// Detect mailing lists via List-Id and List-Unsubscribe headers.
    pub newsletters: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            mailbox: None,
            unread_only: false,
            flagged_only: false,
            unflagged_only: false,
            limit: 10,
            subjects: false,
            newsletters: false,
        }
    }
}

#[derive(Default)]
struct SenderAcc {
    spelling: String,
    count: u64,
    unread: u64,
    newsletter: bool,
    subjects: BTreeSet<String>,
}

fn sender_domain(address: &str) -> Option<String> {
    address
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_ascii_lowercase())
        .filter(|domain| !domain.is_empty())
}

impl<X: Exchange> Client<X> {
    async fn resolve_filter(
        &self,
        mailbox: Option<&str>,
        unread_only: bool,
        flagged_only: bool,
        unflagged_only: bool,
    ) -> Result<Option<Filter>> {
        let mailbox_id = match mailbox {
            Some(reference) => Some(self.resolve_mailbox(reference).await?.id),
            None => None,
        };
        Ok(build_filter(
            mailbox_id,
            unread_only,
            flagged_only,
            unflagged_only,
        ))
    }

    async fn fetch_page(
        &self,
        filter: Option<&Filter>,
        properties: &[&str],
        position: i64,
    ) -> Result<Vec<Email>> {
        let mut req = Request::new();
        let query_id = req.invoke(&email::Query {
            account_id: self.account_id().clone(),
            filter: filter.cloned(),
            sort: vec![Comparator {
                property: "receivedAt".to_string(),
                is_ascending: false,
            }],
            position,
            limit: Some(PAGE_SIZE),
            calculate_total: false,
        })?;
        let get_id = req.invoke(&email::Get {
            account_id: self.account_id().clone(),
            ids_ref: Some(ResultReference {
                result_of: query_id.clone(),
                name: "Email/query".to_string(),
                path: "/ids".to_string(),
            }),
            properties: Some(properties.iter().map(ToString::to_string).collect()),
            ..email::Get::default()
        })?;

        let response = self.send(&req).await?;
        let get = expect_email_get(response, &get_id)?;
        debug!(position, page_len = get.list.len(), "aggregated one page");
        Ok(get.list)
    }

    /// Counts emails per sender, most prolific first.
    ///
    /// Pages through all matching emails in [`PAGE_SIZE`] chunks;
    /// senders are keyed by address, case-insensitively, and the first
    /// spelling seen is the one reported.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable mailbox reference or a failed
    /// exchange.
    pub async fn aggregate_by_sender(&self, options: &StatsOptions) -> Result<Vec<SenderCount>> {
        let filter = self
            .resolve_filter(
                options.mailbox.as_deref(),
                options.unread_only,
                options.flagged_only,
                options.unflagged_only,
            )
            .await?;

        let mut properties = vec!["id", "from"];
        if options.subjects {
            properties.push("subject");
        }

        let mut accum: BTreeMap<String, SenderAcc> = BTreeMap::new();
        let mut position = 0i64;
        loop {
            let page = self
                .fetch_page(filter.as_ref(), &properties, position)
                .await?;
            let page_len = page.len();

            for email in &page {
                let Some(from) = email.from.first() else {
                    continue;
                };
                let key = from.email.to_ascii_lowercase();
                if key.is_empty() {
                    continue;
                }
                let acc = accum.entry(key).or_default();
                if acc.spelling.is_empty() {
                    acc.spelling = from.email.clone();
                }
                acc.count += 1;
                if options.subjects {
                    if let Some(subject) = email.subject.as_deref().filter(|s| !s.is_empty()) {
                        acc.subjects.insert(subject.to_string());
                    }
                }
            }

            if u64::try_from(page_len).unwrap_or(u64::MAX) < PAGE_SIZE {
                break;
            }
            position += i64::try_from(page_len).unwrap_or(i64::MAX);
        }

        let mut senders: Vec<SenderCount> = accum
            .into_values()
            .map(|acc| SenderCount {
                sender: acc.spelling,
                count: acc.count,
                subjects: acc.subjects.into_iter().collect(),
            })
            .collect();
        senders.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sender.cmp(&b.sender)));
        senders.truncate(options.top);
        Ok(senders)
    }

    /// A single-pass triage overview: per-sender and per-domain
    /// counts with unread totals, and optional newsletter detection.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable mailbox reference or a failed
    /// exchange.
    pub async fn summary(&self, options: &SummaryOptions) -> Result<TriageSummary> {
        let filter = self
            .resolve_filter(
                options.mailbox.as_deref(),
                options.unread_only,
                options.flagged_only,
                options.unflagged_only,
            )
            .await?;

        let mut properties = vec!["id", "from", "keywords"];
        if options.subjects {
            properties.push("subject");
        }
        if options.newsletters {
            properties.push("headers");
        }

        let mut senders: BTreeMap<String, SenderAcc> = BTreeMap::new();
        let mut domains: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        let mut total = 0u64;
        let mut unread_total = 0u64;
        let mut position = 0i64;
        loop {
            let page = self
                .fetch_page(filter.as_ref(), &properties, position)
                .await?;
            let page_len = page.len();

            for email in &page {
                total += 1;
                let unread = !email.has_keyword("$seen");
                if unread {
                    unread_total += 1;
                }
                let Some(from) = email.from.first() else {
                    continue;
                };
                let key = from.email.to_ascii_lowercase();
                if key.is_empty() {
                    continue;
                }
                if let Some(domain) = sender_domain(&key) {
                    let entry = domains.entry(domain).or_default();
                    entry.0 += 1;
                    if unread {
                        entry.1 += 1;
                    }
                }
                let acc = senders.entry(key).or_default();
                if acc.spelling.is_empty() {
                    acc.spelling = from.email.clone();
                }
                acc.count += 1;
                if unread {
                    acc.unread += 1;
                }
                if options.newsletters
                    && (header_value(email, "List-Id").is_some()
                        || header_value(email, "List-Unsubscribe").is_some())
                {
                    acc.newsletter = true;
                }
                if options.subjects {
                    if let Some(subject) = email.subject.as_deref().filter(|s| !s.is_empty()) {
                        acc.subjects.insert(subject.to_string());
                    }
                }
            }

            if u64::try_from(page_len).unwrap_or(u64::MAX) < PAGE_SIZE {
                break;
            }
            position += i64::try_from(page_len).unwrap_or(i64::MAX);
        }

        let mut sender_list: Vec<SenderBreakdown> = senders
            .into_values()
            .map(|acc| SenderBreakdown {
                sender: acc.spelling,
                count: acc.count,
                unread: acc.unread,
                newsletter: options.newsletters.then_some(acc.newsletter),
                subjects: acc.subjects.into_iter().collect(),
            })
            .collect();
        sender_list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sender.cmp(&b.sender)));
        sender_list.truncate(options.limit);

        let mut domain_list: Vec<DomainBreakdown> = domains
            .into_iter()
            .map(|(domain, (count, unread))| DomainBreakdown {
                domain,
                count,
                unread,
            })
            .collect();
        domain_list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
        domain_list.truncate(options.limit);

        Ok(TriageSummary {
            mailbox: options.mailbox.clone().unwrap_or_else(|| "all mail".to_string()),
            total,
            unread: unread_total,
            senders: sender_list,
            domains: domain_list,
        })
    }
}
