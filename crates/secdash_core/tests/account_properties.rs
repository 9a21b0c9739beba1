use proptest::prelude::*;
use secdash_core::{
    AccountError, AccountEvents, AccountService, ActiveAccountPolicy, Identity,
    MemoryKeyValueStore, SharedStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn service(policy: ActiveAccountPolicy) -> AccountService {
    let store: SharedStore = Arc::new(MemoryKeyValueStore::new());
    AccountService::with_policy(store, AccountEvents::new(), policy)
}

fn identity_strategy() -> impl Strategy<Value = Identity> {
    (
        "[A-Za-z ]{1,12}",
        "[a-e]{1,2}@[a-c]\\.com",
        prop_oneof![Just(String::new()), "https://img/[a-z]{1,6}\\.png"],
    )
        .prop_map(|(name, email, avatar)| Identity::new(name, email, avatar))
}

proptest! {
    #[test]
    fn given_any_store_sequence_when_loaded_then_one_entry_per_email(
        identities in prop::collection::vec(identity_strategy(), 1..20)
    ) {
        let accounts = service(ActiveAccountPolicy::Unchecked);
        let mut expected: BTreeMap<String, Identity> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();

        for identity in &identities {
            accounts.store_account(identity).unwrap();
            if !expected.contains_key(&identity.email) {
                order.push(identity.email.clone());
            }
            expected.insert(identity.email.clone(), identity.clone());
        }

        let loaded = accounts.load_accounts();
        let loaded_order: Vec<String> =
            loaded.iter().map(|identity| identity.email.clone()).collect();
        prop_assert_eq!(loaded_order, order);
        for identity in &loaded {
            prop_assert_eq!(Some(identity), expected.get(&identity.email));
        }
        let active_account = accounts.get_active_account();
        prop_assert_eq!(active_account.as_ref(), identities.last());
    }

    #[test]
    fn given_unchecked_policy_when_activating_unknown_email_then_pointer_dangles(
        stored in identity_strategy(),
        active in identity_strategy()
    ) {
        prop_assume!(stored.email != active.email);
        let accounts = service(ActiveAccountPolicy::Unchecked);
        accounts.store_account(&stored).unwrap();

        accounts.update_active_account(&active).unwrap();

        prop_assert_eq!(accounts.get_active_account(), Some(active.clone()));
        prop_assert!(accounts
            .load_accounts()
            .iter()
            .all(|identity| identity.email != active.email));
    }

    #[test]
    fn given_require_known_policy_when_activating_then_only_stored_emails_pass(
        stored in identity_strategy(),
        active in identity_strategy()
    ) {
        let accounts = service(ActiveAccountPolicy::RequireKnown);
        accounts.store_account(&stored).unwrap();

        let result = accounts.update_active_account(&active);

        if active.email == stored.email {
            prop_assert!(result.is_ok());
            prop_assert_eq!(accounts.get_active_account(), Some(active.clone()));
        } else {
            prop_assert!(matches!(result, Err(AccountError::UnknownAccount(_))));
            prop_assert_eq!(accounts.get_active_account(), Some(stored.clone()));
        }
    }
}
