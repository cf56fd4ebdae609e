//! Service layer API for report ledger operations
//!
//! Every mutating call reads and checks first, then commits. A failed call
//! leaves every store exactly as it found it. Id allocation, counter bumps
//! and grant creation are atomic against concurrent callers sharing one
//! database; status and history writes are last-writer-wins.
use super::access::{self, Capability, CapabilitySet, CollaboratorGrant};
use super::attachment::{Attachment, ContentHash};
use super::config::LedgerConfig;
use super::context::{CallContext, Principal};
use super::error::LedgerError;
use super::history::HistoryEntry;
use super::ids::IdGenerator;
use super::limits::{MAX_ATTACHMENT_DESCRIPTION_LEN, MAX_CHANGES_LEN, check_len};
use super::metrics::{Counter, Metrics};
use super::report::{Report, ReportDraft, ReportId};
use super::store::{self, Stores, abortable};
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ReportLedger {
    instance: Arc<sled::Db>,
    stores: Stores,
    ids: IdGenerator,
}

impl ReportLedger {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, LedgerError> {
        let stores = Stores::open(&instance)?;
        let ids = IdGenerator::open(&instance)?;
        Ok(Self {
            instance,
            stores,
            ids,
        })
    }

    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let db = config.to_sled().open()?;
        info!(
            path = %config.path.display(),
            temporary = config.temporary,
            "Opened report ledger"
        );
        Self::new(Arc::new(db))
    }

    /// Block until everything written so far is on disk.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.instance.flush()?;
        Ok(())
    }

    fn require_report(&self, report_id: ReportId) -> Result<Report, LedgerError> {
        self.get_report(report_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("report {report_id}")))
    }

    fn require_metrics(&self, report_id: ReportId) -> Result<Metrics, LedgerError> {
        self.get_metrics(report_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("metrics for report {report_id}")))
    }

    fn authorized(
        &self,
        report: &Report,
        identity: &Principal,
        capability: Capability,
    ) -> Result<bool, LedgerError> {
        if &report.owner == identity {
            return Ok(true);
        }
        let grant = self.get_collaborator(report.id, identity)?;
        Ok(access::is_authorized(report, grant.as_ref(), identity, capability))
    }

    fn authorize(
        &self,
        report: &Report,
        caller: &Principal,
        capability: Capability,
    ) -> Result<(), LedgerError> {
        if self.authorized(report, caller, capability)? {
            return Ok(());
        }
        warn!(report_id = %report.id, %caller, %capability, "Authorization denied");
        Err(LedgerError::Unauthorized(format!(
            "{caller} lacks {capability} on report {}",
            report.id
        )))
    }

    fn bump(&self, report_id: ReportId, counter: Counter) -> Result<Metrics, LedgerError> {
        let key = store::report_key(report_id)?;
        let outcome: TransactionResult<Metrics, LedgerError> =
            self.stores.metrics.transaction(|metrics| {
                let current: Metrics = match metrics.get(key.as_slice())? {
                    Some(bytes) => abortable(minicbor::decode(&bytes))?,
                    None => {
                        return Err(ConflictableTransactionError::Abort(LedgerError::NotFound(
                            format!("metrics for report {report_id}"),
                        )));
                    }
                };
                let next = current.incremented(counter);
                metrics.insert(key.as_slice(), abortable(minicbor::to_vec(next))?)?;
                Ok(next)
            });
        let next = outcome?;

        debug!(%report_id, %counter, value = next.get(counter), "Counter incremented");
        Ok(next)
    }

    /// Submit a new report. The report starts in the `open` status with
    /// zeroed metrics.
    pub fn submit(&self, ctx: &CallContext, draft: ReportDraft) -> Result<ReportId, LedgerError> {
        draft.validate()?;
        let metrics_cbor = minicbor::to_vec(Metrics::default())?;

        // the id is read, checked and consumed in the same transaction that
        // writes the report, so concurrent submits never share an id
        let outcome: TransactionResult<ReportId, LedgerError> =
            (&self.stores.reports, &self.stores.metrics, self.ids.tree()).transaction(
                |(reports, metrics, counters)| {
                    let reservation = IdGenerator::reserve(counters, &ctx.caller)?;
                    let report_id = reservation.id;
                    let report_key = abortable(store::report_key(report_id))?;
                    if reports.get(report_key.as_slice())?.is_some() {
                        return Err(ConflictableTransactionError::Abort(
                            LedgerError::AlreadyExists(format!("report {report_id}")),
                        ));
                    }

                    let report =
                        draft.clone().into_report(report_id, ctx.caller.clone(), ctx.clock);
                    reports.insert(report_key.as_slice(), abortable(minicbor::to_vec(&report))?)?;
                    metrics.insert(report_key.as_slice(), metrics_cbor.as_slice())?;
                    reservation.apply(counters)?;
                    Ok(report_id)
                },
            );
        let report_id = outcome?;

        info!(%report_id, owner = %ctx.caller, clock = ctx.clock, "Report submitted");
        Ok(report_id)
    }

    /// Overwrite the status label. No other field is touched.
    pub fn update_status(
        &self,
        ctx: &CallContext,
        report_id: ReportId,
        new_status: &str,
    ) -> Result<Report, LedgerError> {
        let report = self.require_report(report_id)?;
        self.authorize(&report, &ctx.caller, Capability::UpdateStatus)?;

        let updated = Report {
            status: new_status.to_string(),
            ..report
        };
        store::write(&self.stores.reports, &store::report_key(report_id)?, &updated)?;

        debug!(%report_id, caller = %ctx.caller, status = new_status, "Status updated");
        Ok(updated)
    }

    /// Owner-only. Grants cannot be changed or revoked once made.
    pub fn add_collaborator(
        &self,
        ctx: &CallContext,
        report_id: ReportId,
        collaborator: &Principal,
        role: &str,
        permissions: &[Capability],
    ) -> Result<CollaboratorGrant, LedgerError> {
        let report = self.require_report(report_id)?;
        if report.owner != ctx.caller {
            warn!(%report_id, caller = %ctx.caller, "Non-owner tried to add a collaborator");
            return Err(LedgerError::Unauthorized(format!(
                "only the owner of report {report_id} may add collaborators"
            )));
        }
        let permissions = CapabilitySet::bounded(permissions)?;

        let key = store::composite_key(report_id, collaborator)?;
        let grant = CollaboratorGrant {
            role: role.to_string(),
            permissions,
            granted_at: ctx.clock,
        };
        let created = self.stores.collaborators.compare_and_swap(
            &key,
            None as Option<&[u8]>,
            Some(minicbor::to_vec(&grant)?),
        )?;
        if created.is_err() {
            return Err(LedgerError::AlreadyExists(format!(
                "{collaborator} already collaborates on report {report_id}"
            )));
        }

        debug!(%report_id, %collaborator, role, "Collaborator added");
        Ok(grant)
    }

    /// Write the entry for `version`, replacing whatever was there. Version
    /// numbers are the caller's to manage.
    pub fn record_history(
        &self,
        ctx: &CallContext,
        report_id: ReportId,
        changes: &str,
        version: u64,
    ) -> Result<HistoryEntry, LedgerError> {
        let report = self.require_report(report_id)?;
        self.authorize(&report, &ctx.caller, Capability::RecordHistory)?;
        check_len("changes", changes, MAX_CHANGES_LEN)?;

        let entry = HistoryEntry::new(ctx.caller.clone(), changes.to_string(), ctx.clock);
        let key = store::composite_key(report_id, version)?;
        let replaced = self
            .stores
            .history
            .insert(key, minicbor::to_vec(&entry)?)?
            .is_some();

        debug!(%report_id, version, replaced, caller = %ctx.caller, "History recorded");
        Ok(entry)
    }

    /// Attach a content reference and return its attachment id.
    ///
    /// The id is the caller's report-submission count plus one. It is not
    /// advanced by this call, so a caller attaching twice to the same report
    /// without submitting in between replaces the earlier attachment, and
    /// ids are neither sequential nor unique within a report.
    pub fn add_attachment(
        &self,
        ctx: &CallContext,
        report_id: ReportId,
        hash: ContentHash,
        description: &str,
    ) -> Result<u64, LedgerError> {
        let report = self.require_report(report_id)?;
        self.authorize(&report, &ctx.caller, Capability::AddAttachment)?;
        check_len("description", description, MAX_ATTACHMENT_DESCRIPTION_LEN)?;

        let attachment_id = self.ids.user_report_count(&ctx.caller)?.saturating_add(1);
        let attachment = Attachment {
            hash,
            description: description.to_string(),
            author: ctx.caller.clone(),
            timestamp: ctx.clock,
        };
        store::write(
            &self.stores.attachments,
            &store::composite_key(report_id, attachment_id)?,
            &attachment,
        )?;

        debug!(%report_id, attachment_id, %hash, caller = %ctx.caller, "Attachment added");
        Ok(attachment_id)
    }

    /// Public reports only.
    pub fn upvote(&self, report_id: ReportId) -> Result<Metrics, LedgerError> {
        self.vote(report_id, Counter::Upvotes)
    }

    /// Public reports only.
    pub fn downvote(&self, report_id: ReportId) -> Result<Metrics, LedgerError> {
        self.vote(report_id, Counter::Downvotes)
    }

    fn vote(&self, report_id: ReportId, counter: Counter) -> Result<Metrics, LedgerError> {
        let report = self.require_report(report_id)?;
        self.require_metrics(report_id)?;
        if !report.visibility.is_public() {
            warn!(%report_id, %counter, "Vote on private report rejected");
            return Err(LedgerError::Unauthorized(format!(
                "report {report_id} is private"
            )));
        }
        self.bump(report_id, counter)
    }

    /// Anyone may view a public report; a private one needs the owner or
    /// the `view` capability.
    pub fn increment_view(
        &self,
        ctx: &CallContext,
        report_id: ReportId,
    ) -> Result<Metrics, LedgerError> {
        let report = self.require_report(report_id)?;
        self.require_metrics(report_id)?;
        if !report.visibility.is_public() {
            self.authorize(&report, &ctx.caller, Capability::ViewReport)?;
        }
        self.bump(report_id, Counter::Views)
    }

    pub fn increment_resolution_attempt(
        &self,
        ctx: &CallContext,
        report_id: ReportId,
    ) -> Result<Metrics, LedgerError> {
        let report = self.require_report(report_id)?;
        self.require_metrics(report_id)?;
        self.authorize(&report, &ctx.caller, Capability::UpdateMetrics)?;
        self.bump(report_id, Counter::ResolutionAttempts)
    }

    // Read paths. Absence is `None`, never an error.

    pub fn get_report(&self, report_id: ReportId) -> Result<Option<Report>, LedgerError> {
        store::read(&self.stores.reports, &store::report_key(report_id)?)
    }

    pub fn get_metrics(&self, report_id: ReportId) -> Result<Option<Metrics>, LedgerError> {
        store::read(&self.stores.metrics, &store::report_key(report_id)?)
    }

    pub fn get_collaborator(
        &self,
        report_id: ReportId,
        collaborator: &Principal,
    ) -> Result<Option<CollaboratorGrant>, LedgerError> {
        store::read(
            &self.stores.collaborators,
            &store::composite_key(report_id, collaborator)?,
        )
    }

    pub fn get_history(
        &self,
        report_id: ReportId,
        version: u64,
    ) -> Result<Option<HistoryEntry>, LedgerError> {
        store::read(&self.stores.history, &store::composite_key(report_id, version)?)
    }

    pub fn get_attachment(
        &self,
        report_id: ReportId,
        attachment_id: u64,
    ) -> Result<Option<Attachment>, LedgerError> {
        store::read(
            &self.stores.attachments,
            &store::composite_key(report_id, attachment_id)?,
        )
    }

    pub fn get_user_report_count(&self, principal: &Principal) -> Result<u64, LedgerError> {
        self.ids.user_report_count(principal)
    }

    /// The shared gate for sibling components. False when the report is absent.
    pub fn is_authorized(
        &self,
        report_id: ReportId,
        identity: &Principal,
        capability: Capability,
    ) -> Result<bool, LedgerError> {
        match self.get_report(report_id)? {
            Some(report) => self.authorized(&report, identity, capability),
            None => Ok(false),
        }
    }

    pub fn list_collaborators(
        &self,
        report_id: ReportId,
    ) -> Result<Vec<(Principal, CollaboratorGrant)>, LedgerError> {
        store::scan_report(&self.stores.collaborators, report_id)
    }

    /// Entries in ascending version order.
    pub fn list_history(
        &self,
        report_id: ReportId,
    ) -> Result<Vec<(u64, HistoryEntry)>, LedgerError> {
        store::scan_report(&self.stores.history, report_id)
    }

    pub fn list_attachments(
        &self,
        report_id: ReportId,
    ) -> Result<Vec<(u64, Attachment)>, LedgerError> {
        store::scan_report(&self.stores.attachments, report_id)
    }

    /// See [`Report::fingerprint`].
    pub fn report_fingerprint(&self, report_id: ReportId) -> Result<Option<String>, LedgerError> {
        self.get_report(report_id)?
            .map(|report| report.fingerprint())
            .transpose()
    }
}
