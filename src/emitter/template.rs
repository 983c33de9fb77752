//! PHP 类的固定文件头与文件尾

/// 文件头（至 `class ... {` 及其后空行）
pub fn header_lines(generator_name: &str, class_name: &str) -> Vec<String> {
    vec![
        "<?php".to_string(),
        "/**".to_string(),
        format!(" * Generated by {} - do not edit.", generator_name),
        " *".to_string(),
        " * This is a list of HTML tags and attributes that are allowed by the".to_string(),
        " * AMP specification. Note that tag names have been converted to lowercase.".to_string(),
        " *".to_string(),
        " * Note: This file only contains tags that are relevant to the `body` of".to_string(),
        " * an AMP page. To include additional elements modify the `excluded_parents`".to_string(),
        " * list in the generator configuration.".to_string(),
        " *".to_string(),
        " * phpcs:ignoreFile".to_string(),
        " */".to_string(),
        format!("class {} {{", class_name),
        String::new(),
    ]
}

/// 访问器方法
pub const FOOTER: &str = "
\t/**
\t * Get allowed tags.
\t *
\t * @since 0.5
\t * @return array Allowed tags.
\t */
\tpublic static function get_allowed_tags() {
\t\treturn self::$allowed_tags;
\t}

\t/**
\t * Get allowed tag.
\t *
\t * Get the rules for a single tag so that the entire data structure needn't be passed around.
\t *
\t * @since 0.7
\t * @param string $node_name Tag name.
\t * @return array|null Allowed tag, or null if the tag does not exist.
\t */
\tpublic static function get_allowed_tag( $node_name ) {
\t\tif ( isset( self::$allowed_tags[ $node_name ] ) ) {
\t\t\treturn self::$allowed_tags[ $node_name ];
\t\t}
\t\treturn null;
\t}

\t/**
\t * Get list of globally-allowed attributes.
\t *
\t * @since 0.5
\t * @return array Allowed tag.
\t */
\tpublic static function get_allowed_attributes() {
\t\treturn self::$globally_allowed_attrs;
\t}

\t/**
\t * Get layout attributes.
\t *
\t * @since 0.5
\t * @return array Allowed tag.
\t */
\tpublic static function get_layout_attributes() {
\t\treturn self::$layout_allowed_attrs;
\t}";
