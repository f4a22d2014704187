/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! End-to-end tests through the public [`Template`] API: schema inference,
//! rendering, partials, and provider-backed external references.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

use formwork_template::{
    FieldSchema, FileSystemProvider, MemoryProvider, SchemaError, Template, TemplateError,
};

const MST_WITH_TYPES: &str = r#"{
    "name" : "test template",
    "default" : "{{variable1}}",
    "string_type" : {{string_variable::string}},
    "array_type" : [
      {{#array_variable}}
        "{{.}}",
      {{/array_variable}}
    ],
    "boolean_type" : {{boolean_variable::boolean}},
    "number_type" : {{number_variable::number}},
    "duplicate_key": "{{variable1}}",
    "hidden_type": {{hidden_variable::hidden}}
"#;

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn schema_json(template: &Template) -> Value {
    serde_json::to_value(template.parameters_schema().unwrap()).unwrap()
}

#[test]
fn test_full_schema_shape() {
    let template = Template::load_raw(MST_WITH_TYPES).unwrap();
    assert_eq!(
        schema_json(&template),
        json!({
            "type": "object",
            "properties": {
                "variable1": { "type": "string", "default": "" },
                "string_variable": { "type": "string", "default": "" },
                "array_variable": {
                    "type": "array",
                    "skip_xform": true,
                    "items": {
                        "default": "",
                        "type": "string"
                    },
                    "default": []
                },
                "boolean_variable": { "type": "boolean", "default": false },
                "number_variable": { "type": "number", "default": 0 },
                "hidden_variable": { "type": "string", "format": "hidden", "default": "" }
            },
            "required": [
                "variable1",
                "string_variable",
                "array_variable",
                "boolean_variable",
                "number_variable"
            ],
            "title": "",
            "description": "",
            "definitions": {}
        })
    );
}

#[test]
fn test_description_extraction() {
    let source = "\
{{!
    Just a basic template
}}
{
    {{foo}}
}
";
    let template = Template::load_raw(source).unwrap();
    assert_eq!(template.description(), "Just a basic template");

    // `{` is an ordinary name character, not a delimiter
    let template = Template::load_raw("{{{foo}}: {{bar}}}").unwrap();
    assert_eq!(template.description(), "");
}

#[test]
fn test_scan_failure_surfaces_on_load() {
    assert!(matches!(
        Template::load_raw("{{foo}").unwrap_err(),
        TemplateError::UnterminatedTag { .. }
    ));
    assert!(matches!(
        Template::load_raw("{{#a}}{{foo}}").unwrap_err(),
        TemplateError::UnclosedSection { .. }
    ));
}

#[test]
fn test_render_empty_template() {
    let template = Template::load_raw("").unwrap();
    assert_eq!(template.render(&Map::new()).unwrap(), "");
}

#[test]
fn test_render_preserves_literal_whitespace() {
    let template = Template::load_raw("\n    {{foo::string}}\n").unwrap();
    assert_eq!(
        template.render(&params(json!({ "foo": "bar" }))).unwrap(),
        "\n    bar\n"
    );
}

#[test]
fn test_render_array_as_json() {
    let template = Template::load_raw("{{values::array}}").unwrap();
    assert_eq!(
        template
            .render(&params(json!({ "values": ["1", "2", "3"] })))
            .unwrap(),
        "[\"1\",\"2\",\"3\"]"
    );
}

#[test]
fn test_render_text_as_json_string() {
    let template = Template::load_raw("{{textvar::text}}").unwrap();
    assert_eq!(
        template
            .render(&params(json!({ "textvar": "multi\nline" })))
            .unwrap(),
        "\"multi\\nline\""
    );
}

#[test]
fn test_render_inverted_section_with_defaults() {
    let template =
        Template::load_raw("{{^skip_foo}}{{foo}}{{/skip_foo}}{{^skip_bar}}bar{{/skip_bar}}")
            .unwrap();

    // skip_bar is unset and defaults to false, so its body renders
    assert_eq!(
        template.render(&params(json!({ "skip_foo": true }))).unwrap(),
        "bar"
    );

    let schema = schema_json(&template);
    assert_eq!(
        schema["properties"]["foo"]["invertDependency"],
        json!(["skip_foo"])
    );
}

#[test]
fn test_render_partial_with_type() {
    let source = "\
view:
  numb: 5
  arr:
    - \"1\"
    - \"2\"
definitions:
  numbpartial:
    template: |
      numb={{numb::integer}}
  arraypartial:
    template: |
      arr={{arr::array}}
template: |
  {{> numbpartial}}
  {{> arraypartial}}
";
    let template = Template::load_yaml(source).unwrap();
    assert_eq!(
        template.render_default().unwrap(),
        "numb=5\narr=[\"1\",\"2\"]\n"
    );
}

#[test]
fn test_render_merged_sections() {
    let source = "\
definitions:
  value:
    type: string
  part_nothing:
    template: |
      {{^value}}
        Nothing
      {{/value}}
  part_value:
    template: |
      {{#value}}
        {{value}}
      {{/value}}
template: |
  {{> part_value}}
  {{> part_nothing}}
";
    let template = Template::load_yaml(source).unwrap();
    assert_eq!(
        template
            .render(&params(json!({ "value": "foo" })))
            .unwrap()
            .trim(),
        "foo"
    );
    assert_eq!(
        template.render(&params(json!({ "value": "" }))).unwrap().trim(),
        "Nothing"
    );
}

#[test]
fn test_schema_nested_inverted_sections() {
    let source = "\
definitions:
  part:
    template: |
      {{^use_existing_a}}
        {{^make_new_b}}
          {{value}}
        {{/make_new_b}}
      {{/use_existing_a}}
template: |
  {{> part}}
";
    let template = Template::load_yaml(source).unwrap();
    let schema = schema_json(&template);
    assert_eq!(
        schema["dependencies"]["value"],
        json!(["use_existing_a", "make_new_b"])
    );
    assert_eq!(
        schema["properties"]["value"]["invertDependency"],
        json!(["use_existing_a", "make_new_b"])
    );
}

#[test]
fn test_schema_dependency_cleanup() {
    let source = "\
{{app_name}}
{{#do_foo}}
  {{app_name}}_foo
{{/do_foo}}
";
    let template = Template::load_raw(source).unwrap();
    let schema = schema_json(&template);
    let required = schema["required"].as_array().unwrap();
    assert!(required.contains(&json!("app_name")));
    assert!(schema.get("dependencies").is_none());
}

#[test]
fn test_schema_titles_from_definitions() {
    let source = "\
definitions:
  foo:
    title: Foo
    description: BarBar
  baz:
    title: Baz
  section:
    title: Section
  inv_section:
    title: Inverted
template: |
  {{foo}}{{baz}}{{empty}}
  {{#section}}{{/section}}
  {{^inv_section}}{{/inv_section}}
";
    let template = Template::load_yaml(source).unwrap();
    let schema = schema_json(&template);
    let properties = &schema["properties"];
    assert_eq!(properties["foo"]["title"], "Foo");
    assert_eq!(properties["foo"]["description"], "BarBar");
    assert_eq!(properties["baz"]["title"], "Baz");
    assert!(properties["baz"].get("description").is_none());
    assert!(properties["empty"].get("title").is_none());
    assert_eq!(properties["section"]["title"], "Section");
    assert_eq!(properties["inv_section"]["title"], "Inverted");
}

#[test]
fn test_schema_property_order() {
    let source = "\
definitions:
  foo:
    title: Foo
  baz:
    title: Baz
template: |
  {{bar}}{{baz}}{{foo}}{{other}}
";
    let template = Template::load_yaml(source).unwrap();
    let schema = template.parameters_schema().unwrap();
    let names: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["foo", "baz", "bar", "other"]);
}

#[test]
fn test_provider_resolution_records_definition() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("types.json"),
        serde_json::to_string(&json!({
            "definitions": {
                "port": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 65535,
                    "default": 443
                }
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let provider = Arc::new(FileSystemProvider::new(dir.path()));
    let template = Template::load_raw("{{virtual_port:types:port}}")
        .unwrap()
        .with_provider(provider);
    let schema = schema_json(&template);
    assert_eq!(schema["definitions"]["port"]["type"], "integer");
    assert_eq!(schema["properties"]["virtual_port"]["default"], json!(443));
    assert_eq!(
        template
            .render(&params(json!({ "virtual_port": 8080 })))
            .unwrap(),
        "8080"
    );
}

#[test]
fn test_render_does_not_need_schema() {
    // schema building fails without a provider, rendering still works
    let template = Template::load_raw("port={{virtual_port:types:port}}").unwrap();
    assert!(template.parameters_schema().is_err());
    assert_eq!(
        template
            .render(&params(json!({ "virtual_port": 443 })))
            .unwrap(),
        "port=443"
    );
}

#[test]
fn test_definition_metadata_overrides_provider() {
    let provider = Arc::new(MemoryProvider::with_definitions([(
        "types",
        "port",
        FieldSchema {
            default: Some(json!(443)),
            minimum: Some(serde_json::Number::from(0)),
            maximum: Some(serde_json::Number::from(65535)),
            ..FieldSchema::of_type("integer")
        },
    )]));
    let source = "\
definitions:
  https_port:
    title: Foo
    description: Very Foo
    default: 500
template: |
  {{https_port:types:port}}
";
    let template = Template::load_yaml(source).unwrap().with_provider(provider);
    let schema = schema_json(&template);
    let https_port = &schema["properties"]["https_port"];
    assert_eq!(https_port["title"], "Foo");
    assert_eq!(https_port["description"], "Very Foo");
    assert_eq!(https_port["minimum"], json!(0));
    assert_eq!(https_port["default"], json!(500));
}

#[test]
fn test_conflicting_types_across_template() {
    let err = Template::load_raw("{{port::integer}} {{port::string}}")
        .unwrap()
        .parameters_schema()
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::Schema(SchemaError::ConflictingType { .. })
    ));
}

#[test]
fn test_validation_reports_paths() {
    let template = Template::load_raw("{{#servers}}{{host}}{{/servers}}").unwrap();
    let err = template
        .validate_parameters(&params(json!({ "servers": [{ "host": 1 }] })))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("servers"), "unexpected message: {message}");

    assert!(
        template
            .validate_parameters(&params(json!({ "servers": [{ "host": "a" }] })))
            .is_ok()
    );
}

#[test]
fn test_json_round_trip_preserves_behavior() {
    let template = Template::load_raw(MST_WITH_TYPES).unwrap();
    let restored = Template::from_json_str(&template.to_json().unwrap()).unwrap();
    assert_eq!(restored, template);
    assert_eq!(schema_json(&restored), schema_json(&template));
}

#[test]
fn test_from_json_with_provider() {
    let provider = Arc::new(MemoryProvider::with_definitions([(
        "types",
        "port",
        FieldSchema {
            default: Some(json!(443)),
            ..FieldSchema::of_type("integer")
        },
    )]));
    let template = Template::load_raw("{{virtual_port:types:port}}")
        .unwrap()
        .with_provider(provider.clone());
    let json = template.to_json().unwrap();

    // without a provider the reference cannot resolve
    let bare = Template::from_json_str(&json).unwrap();
    assert!(bare.parameters_schema().is_err());

    let restored = Template::from_json_with_provider(&json, provider).unwrap();
    assert_eq!(schema_json(&restored), schema_json(&template));
}
