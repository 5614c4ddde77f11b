//! Packing per-owner emissions into earnings records.

use chrono::NaiveDate;
use harvest_types::{AssetId, Date, Earning, MultisigScript, Value, YieldProgram, DATE_FORMAT};
use std::collections::BTreeMap;

/// Convert per-owner emissions into the final per-day earnings, along with
/// a per-owner total of the emitted asset.
///
/// Owners whose emissions total zero are omitted from the earnings list,
/// and only non-zero per-LP entries are kept in the breakdown. When the
/// program configures an earning expiration, the expiration timestamp is
/// the earned date (at midnight) plus the configured duration; an
/// unparseable date is a misconfiguration and panics. The returned list is
/// sorted ascending by owner id.
pub fn emissions_by_owner_to_earnings(
    date: &Date,
    program: &YieldProgram,
    emissions_by_owner: &BTreeMap<String, BTreeMap<AssetId, u64>>,
    owners_by_id: &BTreeMap<String, MultisigScript>,
) -> (Vec<Earning>, BTreeMap<String, u64>) {
    let mut earnings = Vec::new();
    let mut total_by_owner: BTreeMap<String, u64> = BTreeMap::new();

    for (owner_id, per_lp_token) in emissions_by_owner {
        let mut owner_total = 0u64;
        let mut value_by_lp_token = BTreeMap::new();
        for (lp_token, amount) in per_lp_token {
            owner_total += amount;
            *total_by_owner.entry(owner_id.clone()).or_default() += amount;
            if *amount > 0 {
                value_by_lp_token.insert(
                    lp_token.clone(),
                    Value::from_coin(program.emitted_asset.clone(), *amount),
                );
            }
        }
        if owner_total == 0 {
            continue;
        }

        let expiration_date = program.earning_expiration.map(|expiration| {
            let earned = NaiveDate::parse_from_str(date, DATE_FORMAT)
                .unwrap_or_else(|_| panic!("invalid date {date}"))
                .and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time of day");
            earned
                + chrono::Duration::from_std(expiration)
                    .unwrap_or_else(|_| panic!("earning expiration {expiration:?} out of range"))
        });

        earnings.push(Earning {
            owner_id: owner_id.clone(),
            owner: owners_by_id
                .get(owner_id)
                .cloned()
                .unwrap_or_else(|| panic!("no owner script recorded for {owner_id}")),
            program_id: program.id.clone(),
            earned_date: date.clone(),
            expiration_date,
            value: Value::from_coin(program.emitted_asset.clone(), owner_total),
            value_by_lp_token,
        });
    }

    // BTreeMap iteration already yields owners in ascending order, which is
    // the documented output order.
    (earnings, total_by_owner)
}
