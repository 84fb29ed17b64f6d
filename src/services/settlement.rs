//! Equal-split settlement and group management
//!
//! `compute_settlement` works out how far each member is from an equal share
//! of the group's spend. It is a pure projection of its input and knows
//! nothing about roles; `GroupService` enforces who may create, change and
//! override groups and their settlements.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{BucketKey, Group, GroupId, MemberId, Membership, Role, Transaction};
use crate::storage::Storage;

/// Classification of a member's balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// Spent more than the equal share
    Overpaid,
    /// Spent less than the equal share
    Underpaid,
    /// Within rounding tolerance of the equal share
    Settled,
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overpaid => write!(f, "overpaid"),
            Self::Underpaid => write!(f, "underpaid"),
            Self::Settled => write!(f, "settled"),
        }
    }
}

/// One member's position in an equal split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementRow {
    pub member: MemberId,
    pub spent: Decimal,
    pub should_have_spent: Decimal,
    /// `spent - should_have_spent`
    pub balance: Decimal,
    pub status: SettlementStatus,
}

/// Equal-split settlement of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub group_total: Decimal,
    pub member_count: usize,
    /// Equal share, identical for every member
    pub should_have_spent: Decimal,
    pub epsilon: Decimal,
    /// Rows ordered by member id ascending
    pub rows: Vec<SettlementRow>,
}

impl Settlement {
    pub fn row(&self, member: &MemberId) -> Option<&SettlementRow> {
        self.rows.iter().find(|r| &r.member == member)
    }

    /// Sum of all balances; zero up to division rounding
    pub fn balance_sum(&self) -> Decimal {
        self.rows.iter().map(|r| r.balance).sum()
    }

    pub fn is_settled(&self) -> bool {
        self.rows.iter().all(|r| r.status == SettlementStatus::Settled)
    }
}

/// Default tolerance for a settled balance: half a cent
pub fn default_epsilon() -> Decimal {
    Decimal::new(5, 3)
}

/// Classify a balance with the given tolerance
pub fn classify(balance: Decimal, epsilon: Decimal) -> SettlementStatus {
    if balance > epsilon {
        SettlementStatus::Overpaid
    } else if balance < -epsilon {
        SettlementStatus::Underpaid
    } else {
        SettlementStatus::Settled
    }
}

/// Compute each member's deviation from an equal share
///
/// Every entry counts as a member, including those with zero spend. Output
/// rows are ordered by member id whatever the input order.
///
/// # Errors
///
/// Returns `DivisionUndefined` when `member_spend` is empty.
pub fn compute_settlement<'a, I>(member_spend: I, epsilon: Decimal) -> TallyResult<Settlement>
where
    I: IntoIterator<Item = (&'a MemberId, &'a Decimal)>,
{
    let mut spend: BTreeMap<&MemberId, Decimal> = BTreeMap::new();
    for (member, amount) in member_spend {
        *spend.entry(member).or_default() += *amount;
    }

    if spend.is_empty() {
        return Err(TallyError::DivisionUndefined);
    }

    let member_count = spend.len();
    let group_total: Decimal = spend.values().copied().sum();
    let should_have_spent = group_total / Decimal::from(member_count);

    let rows = spend
        .into_iter()
        .map(|(member, spent)| {
            let balance = spent - should_have_spent;
            SettlementRow {
                member: member.clone(),
                spent,
                should_have_spent,
                balance,
                status: classify(balance, epsilon),
            }
        })
        .collect();

    Ok(Settlement {
        group_total,
        member_count,
        should_have_spent,
        epsilon,
        rows,
    })
}

/// Per-member spend totals for a set of group expenses
///
/// Every listed member appears, with zero if they spent nothing. Owners of
/// expenses who are not listed are included as well, so the totals always
/// add up to the expenses' sum.
pub fn member_spend<'a, I>(records: I, members: &[MemberId]) -> BTreeMap<MemberId, Decimal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut spend: BTreeMap<MemberId, Decimal> = members
        .iter()
        .map(|m| (m.clone(), Decimal::ZERO))
        .collect();

    for txn in records {
        *spend.entry(txn.owner.clone()).or_default() += txn.amount.to_decimal();
    }

    spend
}

/// A settlement together with any admin overrides of member balances
#[derive(Debug, Clone, Serialize)]
pub struct GroupSettlement {
    pub group_id: GroupId,
    pub group_name: String,
    pub period: Option<BucketKey>,
    pub settlement: Settlement,
    /// Balances entered by an admin, by member
    pub adjustments: BTreeMap<MemberId, Decimal>,
    /// Group expenses ignored because of unparseable dates
    pub skipped: usize,
}

/// Service for group management and settlement
pub struct GroupService<'a> {
    storage: &'a Storage,
}

impl<'a> GroupService<'a> {
    /// Create a new group service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a group; the creator becomes its admin
    pub fn create(&self, name: &str, creator: &MemberId) -> TallyResult<Group> {
        if self.storage.groups.find(name)?.is_some() {
            return Err(TallyError::Duplicate {
                entity_type: "Group",
                identifier: name.trim().to_string(),
            });
        }

        let group = Group::new(name, creator.clone());
        group
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.groups.upsert(group.clone())?;
        self.storage.groups.save()?;
        self.storage.log_create(
            EntityType::Group,
            group.id.to_string(),
            Some(group.name.clone()),
            &group,
        )?;

        info!(group = %group.name, creator = %creator, "group created");
        Ok(group)
    }

    /// Find a group by name or ID
    pub fn get(&self, identifier: &str) -> TallyResult<Group> {
        self.storage
            .groups
            .find(identifier)?
            .ok_or_else(|| TallyError::group_not_found(identifier))
    }

    /// All groups, by name
    pub fn list(&self) -> TallyResult<Vec<Group>> {
        self.storage.groups.get_all()
    }

    /// Groups a member belongs to
    pub fn list_for_member(&self, member: &MemberId) -> TallyResult<Vec<Group>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|g| g.is_member(member))
            .collect())
    }

    /// Add a member; only admins may invite
    pub fn add_member(
        &self,
        identifier: &str,
        actor: &MemberId,
        member: &MemberId,
        role: Role,
    ) -> TallyResult<Group> {
        let mut group = self.get(identifier)?;
        self.require_admin(&group, actor, "invite members")?;

        if group.is_member(member) {
            return Err(TallyError::Duplicate {
                entity_type: "Member",
                identifier: member.to_string(),
            });
        }

        let before = group.clone();
        group.members.push(Membership::new(member.clone(), role));
        self.persist_update(&before, &group, format!("added {} as {}", member, role))?;

        info!(group = %group.name, member = %member, %role, "member added");
        Ok(group)
    }

    /// Remove a member; only the creator may remove, and not themselves
    pub fn remove_member(
        &self,
        identifier: &str,
        actor: &MemberId,
        member: &MemberId,
    ) -> TallyResult<Group> {
        let mut group = self.get(identifier)?;

        if &group.created_by != actor {
            return Err(TallyError::PermissionDenied(
                "only the group creator can remove members".into(),
            ));
        }
        if member == actor {
            return Err(TallyError::Validation(
                "the group creator cannot remove themselves".into(),
            ));
        }
        if !group.is_member(member) {
            return Err(TallyError::member_not_found(member.to_string()));
        }

        let before = group.clone();
        group.members.retain(|m| &m.member != member);
        self.persist_update(&before, &group, format!("removed {}", member))?;

        info!(group = %group.name, member = %member, "member removed");
        Ok(group)
    }

    /// Delete a group and its expenses; only the creator may delete
    pub fn delete(&self, identifier: &str, actor: &MemberId) -> TallyResult<Group> {
        let group = self.get(identifier)?;

        if &group.created_by != actor {
            return Err(TallyError::PermissionDenied(
                "only the group creator can delete the group".into(),
            ));
        }

        let removed_expenses = self.storage.expenses.delete_by_group(group.id)?;
        self.storage.expenses.save()?;
        self.storage.groups.delete(group.id)?;
        self.storage.groups.save()?;

        self.storage.log_delete(
            EntityType::Group,
            group.id.to_string(),
            Some(group.name.clone()),
            &group,
        )?;

        info!(group = %group.name, removed_expenses, "group deleted");
        Ok(group)
    }

    /// Equal-split settlement over the group's expenses, optionally limited
    /// to one period
    pub fn settle(
        &self,
        identifier: &str,
        period: Option<BucketKey>,
        epsilon: Decimal,
    ) -> TallyResult<GroupSettlement> {
        let group = self.get(identifier)?;
        let expenses = self.storage.expenses.get_by_group(group.id)?;

        let mut skipped = 0;
        let in_period: Vec<&Transaction> = match period {
            None => expenses.iter().collect(),
            Some(key) => expenses
                .iter()
                .filter(|txn| match txn.parsed_date() {
                    Ok(date) => key.contains(date),
                    Err(_) => {
                        skipped += 1;
                        false
                    }
                })
                .collect(),
        };

        let spend = member_spend(in_period, &group.member_ids());
        let settlement = compute_settlement(&spend, epsilon)?;

        let adjustments = group
            .members
            .iter()
            .filter_map(|m| m.adjusted_balance.map(|b| (m.member.clone(), b)))
            .collect();

        Ok(GroupSettlement {
            group_id: group.id,
            group_name: group.name,
            period,
            settlement,
            adjustments,
            skipped,
        })
    }

    /// Store admin-edited balances for members of the group
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless `actor` is an admin of the group;
    /// `NotFound` if an edited member is not in the group.
    pub fn submit_adjustments(
        &self,
        identifier: &str,
        actor: &MemberId,
        edits: &[(MemberId, Decimal)],
    ) -> TallyResult<Group> {
        let mut group = self.get(identifier)?;
        self.require_admin(&group, actor, "edit settlement balances")?;

        let before = group.clone();
        for (member, balance) in edits {
            let membership = group
                .membership_mut(member)
                .ok_or_else(|| TallyError::member_not_found(member.to_string()))?;
            membership.adjusted_balance = Some(*balance);
        }

        self.persist_update(&before, &group, format!("{} balances edited by {}", edits.len(), actor))?;
        self.storage.log_create(
            EntityType::SettlementAdjustment,
            group.id.to_string(),
            Some(group.name.clone()),
            &edits,
        )?;

        info!(group = %group.name, actor = %actor, edits = edits.len(), "settlement adjusted");
        Ok(group)
    }

    /// Drop all admin-edited balances
    pub fn clear_adjustments(&self, identifier: &str, actor: &MemberId) -> TallyResult<Group> {
        let mut group = self.get(identifier)?;
        self.require_admin(&group, actor, "clear settlement balances")?;

        let before = group.clone();
        for membership in &mut group.members {
            membership.adjusted_balance = None;
        }
        self.persist_update(&before, &group, "balances cleared".to_string())?;
        Ok(group)
    }

    fn require_admin(&self, group: &Group, actor: &MemberId, action: &str) -> TallyResult<()> {
        if group.is_admin(actor) {
            return Ok(());
        }

        warn!(group = %group.name, actor = %actor, action, "permission denied");
        Err(TallyError::PermissionDenied(format!(
            "only admins of '{}' can {}",
            group.name, action
        )))
    }

    fn persist_update(&self, before: &Group, after: &Group, summary: String) -> TallyResult<()> {
        after
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.groups.upsert(after.clone())?;
        self.storage.groups.save()?;
        self.storage.log_update(
            EntityType::Group,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
            Some(summary),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::Money;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn eps() -> Decimal {
        default_epsilon()
    }

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn spend(entries: &[(&str, i64)]) -> BTreeMap<MemberId, Decimal> {
        entries
            .iter()
            .map(|(m, cents)| (MemberId::new(*m), dec(*cents)))
            .collect()
    }

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_three_way_split() {
        let input = spend(&[("A", 30000), ("B", 10000), ("C", 0)]);
        let s = compute_settlement(&input, eps()).unwrap();

        assert_eq!(s.group_total, dec(40000));
        assert_eq!(s.member_count, 3);
        assert_eq!(s.should_have_spent.round_dp(2), dec(13333));

        let a = s.row(&"A".into()).unwrap();
        let b = s.row(&"B".into()).unwrap();
        let c = s.row(&"C".into()).unwrap();
        assert_eq!(a.balance.round_dp(2), dec(16667));
        assert_eq!(a.status, SettlementStatus::Overpaid);
        assert_eq!(b.balance.round_dp(2), dec(-3333));
        assert_eq!(b.status, SettlementStatus::Underpaid);
        assert_eq!(c.balance.round_dp(2), dec(-13333));
        assert_eq!(c.status, SettlementStatus::Underpaid);
    }

    #[test]
    fn test_balances_sum_to_zero() {
        for entries in [
            vec![("A", 30000), ("B", 10000), ("C", 0)],
            vec![("A", 1), ("B", 2), ("C", 3), ("D", 5), ("E", 7), ("F", 11), ("G", 13)],
            vec![("solo", 4242)],
        ] {
            let s = compute_settlement(&spend(&entries), eps()).unwrap();
            assert!(s.balance_sum().abs() <= eps(), "sum {}", s.balance_sum());
            let spent: Decimal = s.rows.iter().map(|r| r.spent).sum();
            assert_eq!(spent, s.group_total);
            assert!(s.rows.iter().all(|r| r.should_have_spent == s.should_have_spent));
        }
    }

    #[test]
    fn test_equal_spend_is_settled() {
        let s = compute_settlement(&spend(&[("A", 2500), ("B", 2500), ("C", 2500)]), eps()).unwrap();
        assert!(s.is_settled());
        assert!(s.rows.iter().all(|r| r.balance.is_zero()));
    }

    #[test]
    fn test_empty_group_is_undefined() {
        let empty: BTreeMap<MemberId, Decimal> = BTreeMap::new();
        assert!(matches!(
            compute_settlement(&empty, eps()),
            Err(TallyError::DivisionUndefined)
        ));
    }

    #[test]
    fn test_output_order_independent_of_input() {
        let mut hashed: HashMap<MemberId, Decimal> = HashMap::new();
        for (m, c) in [("zoe", 100), ("amy", 900), ("max", 0), ("bea", 350)] {
            hashed.insert(m.into(), dec(c));
        }
        let ordered: BTreeMap<MemberId, Decimal> =
            hashed.iter().map(|(k, v)| (k.clone(), *v)).collect();

        let from_hash = compute_settlement(&hashed, eps()).unwrap();
        let from_tree = compute_settlement(&ordered, eps()).unwrap();
        assert_eq!(from_hash, from_tree);

        let members: Vec<&str> = from_hash.rows.iter().map(|r| r.member.as_str()).collect();
        assert_eq!(members, vec!["amy", "bea", "max", "zoe"]);
    }

    #[test]
    fn test_rounding_tolerance() {
        assert_eq!(classify(Decimal::new(4, 3), eps()), SettlementStatus::Settled);
        assert_eq!(classify(Decimal::new(-5, 3), eps()), SettlementStatus::Settled);
        assert_eq!(classify(Decimal::new(6, 3), eps()), SettlementStatus::Overpaid);
        assert_eq!(classify(Decimal::new(-6, 3), eps()), SettlementStatus::Underpaid);
        assert_eq!(classify(dec(40), eps()), SettlementStatus::Overpaid);
        assert_eq!(classify(dec(-1), eps()), SettlementStatus::Underpaid);
    }

    #[test]
    fn test_member_spend_includes_idle_members_and_outsiders() {
        let records = vec![
            Transaction::new("2025-01-01", Money::from_cents(1000), "Food", "alice".into()),
            Transaction::new("2025-01-02", Money::from_cents(500), "Food", "alice".into()),
            Transaction::new("2025-01-03", Money::from_cents(200), "Food", "dave".into()),
        ];
        let members = vec![MemberId::new("alice"), MemberId::new("bob")];

        let totals = member_spend(&records, &members);
        assert_eq!(totals.get(&"alice".into()), Some(&dec(1500)));
        assert_eq!(totals.get(&"bob".into()), Some(&Decimal::ZERO));
        assert_eq!(totals.get(&"dave".into()), Some(&dec(200)));
    }

    #[test]
    fn test_group_lifecycle() {
        let (_temp, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let alice = MemberId::new("alice");
        let bob = MemberId::new("bob");

        service.create("Flat", &alice).unwrap();
        assert!(matches!(
            service.create("flat", &bob),
            Err(TallyError::Duplicate { .. })
        ));

        let err = service.add_member("Flat", &bob, &bob, Role::Member).unwrap_err();
        assert!(matches!(err, TallyError::PermissionDenied(_)));

        let group = service.add_member("Flat", &alice, &bob, Role::Member).unwrap();
        assert_eq!(group.member_ids(), vec![alice.clone(), bob.clone()]);
        assert_eq!(service.list_for_member(&bob).unwrap().len(), 1);

        assert!(matches!(
            service.remove_member("Flat", &alice, &alice),
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            service.delete("Flat", &bob),
            Err(TallyError::PermissionDenied(_))
        ));
        service.delete("Flat", &alice).unwrap();
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_settle_group_with_period() {
        let (_temp, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let alice = MemberId::new("alice");
        let bob = MemberId::new("bob");

        let group = service.create("Trip", &alice).unwrap();
        service.add_member("Trip", &alice, &bob, Role::Member).unwrap();

        for (date, cents, owner) in [
            ("2025-03-02", 9000, &alice),
            ("2025-03-05", 3000, &bob),
            ("2025-04-01", 7000, &bob),
            ("garbage", 1, &bob),
        ] {
            storage
                .expenses
                .upsert(
                    Transaction::new(date, Money::from_cents(cents), "Travel", owner.clone())
                        .with_group(group.id),
                )
                .unwrap();
        }

        let march = service
            .settle("Trip", Some(BucketKey::month(2025, 3)), eps())
            .unwrap();
        assert_eq!(march.settlement.should_have_spent, dec(6000));
        assert_eq!(march.settlement.row(&alice).unwrap().balance, dec(3000));
        assert_eq!(march.skipped, 1);

        let all_time = service.settle("Trip", None, eps()).unwrap();
        assert_eq!(all_time.settlement.group_total, dec(19001));
    }

    #[test]
    fn test_only_admin_can_adjust() {
        let (_temp, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let alice = MemberId::new("alice");
        let bob = MemberId::new("bob");

        service.create("Trip", &alice).unwrap();
        service.add_member("Trip", &alice, &bob, Role::Member).unwrap();

        let edits = vec![(bob.clone(), dec(-1500))];
        assert!(matches!(
            service.submit_adjustments("Trip", &bob, &edits),
            Err(TallyError::PermissionDenied(_))
        ));

        service.submit_adjustments("Trip", &alice, &edits).unwrap();
        let settled = service.settle("Trip", None, eps()).unwrap();
        assert_eq!(settled.adjustments.get(&bob), Some(&dec(-1500)));

        let stranger = vec![(MemberId::new("eve"), dec(1))];
        assert!(service
            .submit_adjustments("Trip", &alice, &stranger)
            .unwrap_err()
            .is_not_found());

        service.clear_adjustments("Trip", &alice).unwrap();
        assert!(service.settle("Trip", None, eps()).unwrap().adjustments.is_empty());
    }

    #[test]
    fn test_failed_adjustment_is_not_audited() {
        let (temp, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let alice = MemberId::new("alice");
        let bob = MemberId::new("bob");

        service.create("Trip", &alice).unwrap();
        service.add_member("Trip", &alice, &bob, Role::Member).unwrap();

        let groups_file = temp.path().join("data").join("groups.json");
        std::fs::remove_file(&groups_file).unwrap();
        std::fs::create_dir(&groups_file).unwrap();

        let edits = vec![(bob.clone(), dec(-1500))];
        assert!(service.submit_adjustments("Trip", &alice, &edits).is_err());

        let adjustments = storage
            .audit()
            .read_all()
            .unwrap()
            .into_iter()
            .filter(|e| e.entity_type == EntityType::SettlementAdjustment)
            .count();
        assert_eq!(adjustments, 0);
    }

    #[test]
    fn test_adjustment_audited_after_save() {
        let (_temp, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let alice = MemberId::new("alice");

        service.create("Flat", &alice).unwrap();
        service
            .submit_adjustments("Flat", &alice, &[(alice.clone(), dec(250))])
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        let last = entries.last().unwrap();
        assert_eq!(last.entity_type, EntityType::SettlementAdjustment);
        assert_eq!(entries[entries.len() - 2].entity_type, EntityType::Group);
    }
}
