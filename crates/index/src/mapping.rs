use serde_json::{Value, json};

fn title_field() -> Value {
    json!({
        "type": "text",
        "fields": {"keyword": {"type": "keyword", "ignore_above": 256}}
    })
}

/// Mapping of the registration collection.
pub fn cce_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "uuid": {"type": "keyword"},
                "title": title_field(),
                "authors": {"type": "text"},
                "publishers": {"type": "text"},
                "lccns": {"type": "keyword"},
                "registrations": {
                    "type": "nested",
                    "properties": {
                        "regnum": {"type": "keyword"},
                        "regdate": {"type": "date"}
                    }
                },
                "date_created": {"type": "date"},
                "date_modified": {"type": "date"}
            }
        }
    })
}

/// Mapping of the renewal collection.
pub fn renewal_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "uuid": {"type": "keyword"},
                "rennum": {"type": "keyword"},
                "rendate": {"type": "date"},
                "title": title_field(),
                "authors": {"type": "text"},
                "claimants": {
                    "type": "nested",
                    "properties": {
                        "name": {"type": "text"},
                        "claim_type": {"type": "keyword"}
                    }
                },
                "date_created": {"type": "date"},
                "date_modified": {"type": "date"}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_fields() {
        let cce = cce_mapping();
        assert_eq!(cce["mappings"]["properties"]["registrations"]["type"], "nested");
        assert_eq!(cce["mappings"]["properties"]["title"]["fields"]["keyword"]["type"], "keyword");
        let ccr = renewal_mapping();
        assert_eq!(ccr["mappings"]["properties"]["claimants"]["properties"]["claim_type"]["type"], "keyword");
    }
}
