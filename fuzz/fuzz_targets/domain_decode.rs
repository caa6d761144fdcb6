#![no_main]

use libfuzzer_sys::fuzz_target;
use odis_domains::{domain_hash, Domain};

fuzz_target!(|data: &[u8]| {
    // Any domain that decodes must also hash
    let Ok(text) = std::str::from_utf8(data) else { return };
    if let Ok(domain) = Domain::from_json(text) {
        domain_hash(&domain).expect("decoded domain must hash");
        let json = serde_json::to_string(&domain).expect("domain serializes");
        assert_eq!(Domain::from_json(&json).ok(), Some(domain));
    }
});
