//! 规则 schema 绑定：通用消息树 → 规则数据模型
//! 字段名即 validator.proto 中的字段名

use super::model::{
    AttrList, AttrSpec, BlacklistedCdataRegex, CdataSpec, DispatchKey, ExtensionSpec, HtmlFormat, PropertySpec,
    PropertySpecList, RuleDocument, TagSpec, UrlSpec,
};
use crate::error::GenResult;
use crate::textproto::{FromTextMessage, TextEnum, TextMessage};

impl TextEnum for HtmlFormat {
    fn from_number(value: i64) -> Option<Self> {
        HtmlFormat::from_number(value)
    }
}

impl TextEnum for DispatchKey {
    fn from_number(value: i64) -> Option<Self> {
        (0..=3).contains(&value).then_some(DispatchKey(value))
    }
}

impl FromTextMessage for RuleDocument {
    const MESSAGE_NAME: &'static str = "ValidatorRules";
    const KNOWN_FIELDS: &'static [&'static str] =
        &["tags", "attr_lists", "spec_file_revision", "min_validator_revision_required"];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            tags: msg.repeated_messages::<Self, TagSpec>("tags")?,
            attr_lists: msg.repeated_messages::<Self, AttrList>("attr_lists")?,
            spec_file_revision: msg.optional_int::<Self>("spec_file_revision")?,
            min_validator_revision_required: msg.optional_int::<Self>("min_validator_revision_required")?,
        })
    }
}

impl FromTextMessage for TagSpec {
    const MESSAGE_NAME: &'static str = "TagSpec";
    const KNOWN_FIELDS: &'static [&'static str] = &[
        "tag_name",
        "spec_name",
        "spec_url",
        "mandatory",
        "mandatory_alternatives",
        "mandatory_parent",
        "mandatory_ancestor",
        "mandatory_ancestor_suggested_alternative",
        "unique",
        "unique_warning",
        "also_requires_tag",
        "also_requires_tag_warning",
        "requires_extension",
        "disallowed_ancestor",
        "html_format",
        "deprecation",
        "extension_spec",
        "attrs",
        "attr_lists",
        "cdata",
    ];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            tag_name: msg.required_string::<Self>("tag_name")?,
            spec_name: msg.optional_string::<Self>("spec_name")?,
            spec_url: msg.optional_string::<Self>("spec_url")?,
            mandatory: msg.optional_bool::<Self>("mandatory")?,
            mandatory_alternatives: msg.optional_string::<Self>("mandatory_alternatives")?,
            mandatory_parent: msg.optional_string::<Self>("mandatory_parent")?,
            mandatory_ancestor: msg.optional_string::<Self>("mandatory_ancestor")?,
            mandatory_ancestor_suggested_alternative: msg
                .optional_string::<Self>("mandatory_ancestor_suggested_alternative")?,
            unique: msg.optional_bool::<Self>("unique")?,
            unique_warning: msg.optional_bool::<Self>("unique_warning")?,
            also_requires_tag: msg.repeated_strings::<Self>("also_requires_tag")?,
            also_requires_tag_warning: msg.repeated_strings::<Self>("also_requires_tag_warning")?,
            requires_extension: msg.repeated_strings::<Self>("requires_extension")?,
            disallowed_ancestor: msg.repeated_strings::<Self>("disallowed_ancestor")?,
            html_format: msg.repeated_enums::<Self, HtmlFormat>("html_format")?,
            deprecation: msg.optional_string::<Self>("deprecation")?,
            extension_spec: msg.optional_message::<Self, ExtensionSpec>("extension_spec")?,
            attrs: msg.repeated_messages::<Self, AttrSpec>("attrs")?,
            attr_lists: msg.repeated_strings::<Self>("attr_lists")?,
            cdata: msg.optional_message::<Self, CdataSpec>("cdata")?,
        })
    }
}

impl FromTextMessage for AttrList {
    const MESSAGE_NAME: &'static str = "AttrList";
    const KNOWN_FIELDS: &'static [&'static str] = &["name", "attrs"];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            name: msg.required_string::<Self>("name")?,
            attrs: msg.repeated_messages::<Self, AttrSpec>("attrs")?,
        })
    }
}

impl FromTextMessage for AttrSpec {
    const MESSAGE_NAME: &'static str = "AttrSpec";
    const KNOWN_FIELDS: &'static [&'static str] = &[
        "name",
        "alternative_names",
        "mandatory",
        "value",
        "value_casei",
        "value_regex",
        "value_regex_casei",
        "blacklisted_value_regex",
        "dispatch_key",
        "value_properties",
        "value_url",
    ];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            name: msg.required_string::<Self>("name")?,
            alternative_names: msg.repeated_strings::<Self>("alternative_names")?,
            mandatory: msg.optional_bool::<Self>("mandatory")?,
            value: msg.optional_string::<Self>("value")?,
            value_casei: msg.optional_string::<Self>("value_casei")?,
            value_regex: msg.optional_string::<Self>("value_regex")?,
            value_regex_casei: msg.optional_string::<Self>("value_regex_casei")?,
            blacklisted_value_regex: msg.optional_string::<Self>("blacklisted_value_regex")?,
            dispatch_key: msg.optional_enum::<Self, DispatchKey>("dispatch_key")?,
            value_properties: msg.optional_message::<Self, PropertySpecList>("value_properties")?,
            value_url: msg.optional_message::<Self, UrlSpec>("value_url")?,
        })
    }
}

impl FromTextMessage for PropertySpecList {
    const MESSAGE_NAME: &'static str = "PropertySpecList";
    const KNOWN_FIELDS: &'static [&'static str] = &["properties"];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            properties: msg.repeated_messages::<Self, PropertySpec>("properties")?,
        })
    }
}

impl FromTextMessage for PropertySpec {
    const MESSAGE_NAME: &'static str = "PropertySpec";
    const KNOWN_FIELDS: &'static [&'static str] = &["name", "mandatory", "value", "value_double"];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            name: msg.required_string::<Self>("name")?,
            mandatory: msg.optional_bool::<Self>("mandatory")?,
            value: msg.optional_string::<Self>("value")?,
            value_double: msg.optional_float::<Self>("value_double")?,
        })
    }
}

impl FromTextMessage for UrlSpec {
    const MESSAGE_NAME: &'static str = "UrlSpec";
    const KNOWN_FIELDS: &'static [&'static str] = &["allowed_protocol", "allow_relative", "allow_empty"];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            allowed_protocol: msg.repeated_strings::<Self>("allowed_protocol")?,
            allow_relative: msg.optional_bool::<Self>("allow_relative")?,
            allow_empty: msg.optional_bool::<Self>("allow_empty")?,
        })
    }
}

impl FromTextMessage for CdataSpec {
    const MESSAGE_NAME: &'static str = "CdataSpec";
    const KNOWN_FIELDS: &'static [&'static str] = &[
        "max_bytes",
        "max_bytes_spec_url",
        "mandatory_cdata",
        "cdata_regex",
        "whitespace_only",
        "blacklisted_cdata_regex",
    ];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            max_bytes: msg.optional_int::<Self>("max_bytes")?,
            max_bytes_spec_url: msg.optional_string::<Self>("max_bytes_spec_url")?,
            mandatory_cdata: msg.optional_string::<Self>("mandatory_cdata")?,
            cdata_regex: msg.optional_string::<Self>("cdata_regex")?,
            whitespace_only: msg.optional_bool::<Self>("whitespace_only")?,
            blacklisted_cdata_regex: msg.repeated_messages::<Self, BlacklistedCdataRegex>("blacklisted_cdata_regex")?,
        })
    }
}

impl FromTextMessage for BlacklistedCdataRegex {
    const MESSAGE_NAME: &'static str = "BlacklistedCDataRegex";
    const KNOWN_FIELDS: &'static [&'static str] = &["regex", "error_message"];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            regex: msg.optional_string::<Self>("regex")?,
            error_message: msg.optional_string::<Self>("error_message")?,
        })
    }
}

impl FromTextMessage for ExtensionSpec {
    const MESSAGE_NAME: &'static str = "ExtensionSpec";
    const KNOWN_FIELDS: &'static [&'static str] = &[
        "name",
        "version",
        "deprecated_version",
        "deprecated_allow_duplicates",
        "requires_usage",
    ];

    fn from_message(msg: &TextMessage) -> GenResult<Self> {
        Ok(Self {
            name: msg.optional_string::<Self>("name")?,
            version: msg.repeated_strings::<Self>("version")?,
            deprecated_version: msg.repeated_strings::<Self>("deprecated_version")?,
            deprecated_allow_duplicates: msg.optional_bool::<Self>("deprecated_allow_duplicates")?,
            requires_usage: msg.optional_ident::<Self>("requires_usage")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AmpGenError;
    use crate::textproto::TextFormatParser;

    fn decode(src: &str) -> GenResult<RuleDocument> {
        RuleDocument::decode(&TextFormatParser::parse(src)?)
    }

    #[test]
    fn test_decode_full_tag() {
        let doc = decode(
            r#"
            spec_file_revision: 491
            min_validator_revision_required: 284
            tags: {
              tag_name: "AMP-IMG"
              html_format: AMP
              html_format: AMP4EMAIL
              mandatory_parent: "BODY"
              also_requires_tag: "amp-img extension .js script"
              attr_lists: "extended-amp-global"
              attrs: {
                name: "src"
                alternative_names: "srcset"
                mandatory: true
                dispatch_key: NAME_VALUE_DISPATCH
                value_url: { allowed_protocol: "http" allowed_protocol: "https" allow_relative: true }
              }
              cdata: { max_bytes: 50000 blacklisted_cdata_regex: { regex: "<!--" error_message: "html comments" } }
            }
            "#,
        )
        .unwrap();

        assert_eq!(doc.spec_file_revision, Some(491));
        assert_eq!(doc.min_validator_revision_required, Some(284));
        let tag = &doc.tags[0];
        assert_eq!(tag.tag_name, "AMP-IMG");
        assert_eq!(tag.html_format, vec![HtmlFormat::Amp, HtmlFormat::Amp4Email]);
        assert_eq!(tag.mandatory_parent.as_deref(), Some("BODY"));
        assert_eq!(tag.attr_lists, vec!["extended-amp-global"]);
        let src = &tag.attrs[0];
        assert_eq!(src.alternative_names, vec!["srcset"]);
        assert_eq!(src.mandatory, Some(true));
        assert_eq!(src.dispatch_key, Some(DispatchKey(2)));
        let url = src.value_url.as_ref().unwrap();
        assert_eq!(url.allowed_protocol, vec!["http", "https"]);
        assert_eq!(url.allow_relative, Some(true));
        let cdata = tag.cdata.as_ref().unwrap();
        assert_eq!(cdata.max_bytes, Some(50000));
        assert_eq!(cdata.blacklisted_cdata_regex[0].regex.as_deref(), Some("<!--"));
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // 测试场景：schema 未建模的字段（含子消息）不影响解码
        let doc = decode(
            r#"
            styles_spec_url: "https://amp.dev/"
            tags: { tag_name: "P" child_tags: { first_child_tag_name_oneof: "X" } }
            "#,
        )
        .unwrap();
        assert_eq!(doc.tags.len(), 1);
    }

    #[test]
    fn test_singular_scalar_last_value_wins() {
        let doc = decode("spec_file_revision: 1\nspec_file_revision: 2\n").unwrap();
        assert_eq!(doc.spec_file_revision, Some(2));
    }

    #[test]
    fn test_singular_message_occurrences_merge() {
        let doc = decode(
            r#"tags: { tag_name: "A" attrs: { name: "href" value_url: { allowed_protocol: "http" } value_url: { allow_relative: false } } }"#,
        )
        .unwrap();
        let url = doc.tags[0].attrs[0].value_url.as_ref().unwrap();
        assert_eq!(url.allowed_protocol, vec!["http"]);
        assert_eq!(url.allow_relative, Some(false));
    }

    #[test]
    fn test_wrong_field_shape_is_schema_error() {
        let err = decode("tags: { tag_name: 42 }").unwrap_err();
        assert!(matches!(err, AmpGenError::SchemaDecode(_)));
        let err = decode("tags: { tag_name: \"A\" mandatory: \"yes\" }").unwrap_err();
        assert!(matches!(err, AmpGenError::SchemaDecode(_)));
        let err = decode("tags: \"A\"").unwrap_err();
        assert!(matches!(err, AmpGenError::SchemaDecode(_)));
    }

    #[test]
    fn test_missing_required_and_unknown_enum() {
        assert!(matches!(decode("tags: { spec_name: \"x\" }"), Err(AmpGenError::SchemaDecode(_))));
        assert!(matches!(
            decode("tags: { tag_name: \"A\" html_format: AMP5 }"),
            Err(AmpGenError::SchemaDecode(_))
        ));
    }

    #[test]
    fn test_legacy_boolean_dispatch_key_and_numeric_enum() {
        let doc = decode("tags: { tag_name: \"A\" html_format: 1 attrs: { name: \"n\" dispatch_key: true } }").unwrap();
        assert_eq!(doc.tags[0].html_format, vec![HtmlFormat::Amp]);
        assert_eq!(doc.tags[0].attrs[0].dispatch_key, Some(DispatchKey(1)));
    }

    #[test]
    fn test_html_format_names_match_identifiers() {
        for format in [HtmlFormat::Amp, HtmlFormat::Amp4Ads, HtmlFormat::Amp4Email, HtmlFormat::Actions] {
            assert_eq!(format.to_string().parse::<HtmlFormat>(), Ok(format));
        }
        assert_eq!(HtmlFormat::Amp4Email.as_str(), "AMP4EMAIL");
    }
}
