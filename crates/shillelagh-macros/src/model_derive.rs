//! Implementation of the Model derive macro.
//!
//! This module reads `#[shillelagh(...)]` struct and field attributes and generates a
//! `shillelagh_core::Model` implementation: static field metadata for the table
//! registry plus the instance accessors the relationship resolver calls.

use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use shillelagh_core::{SemanticType, TypeMapper, is_valid_identifier};
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericArgument, Ident, LitStr, Path, PathArguments,
    Result, Type,
};

/// Parsed definition of a struct with `#[derive(Model)]`.
#[derive(Debug)]
pub struct ModelDef {
    /// The struct name.
    pub name: Ident,
    /// Table name, when the struct carries the table marker.
    pub table: Option<String>,
    /// Engine-only constructor, `Default::default` when absent.
    pub orm_only: Option<Path>,
    /// Persisted fields in declaration order.
    pub fields: Vec<ModelFieldDef>,
}

/// A single persisted field.
#[derive(Debug)]
pub struct ModelFieldDef {
    /// The field name.
    pub name: Ident,
    /// Column name (defaults to the field name).
    pub column: String,
    pub role: FieldRole,
}

/// What a field contributes to the table.
#[derive(Debug)]
pub enum FieldRole {
    Id,
    Scalar {
        semantic: SemanticType,
        nullable: bool,
    },
    ForeignKey {
        nullable: bool,
    },
    OneToOne {
        target: Type,
        nullable: bool,
        /// Held as `Box<T>`, which self-referential and cyclic one-to-one links need.
        boxed: bool,
    },
    OneToMany {
        target: Type,
        foreign_key: Option<String>,
    },
}

/// Field attributes before the role is decided.
#[derive(Debug, Default)]
struct FieldAttrs {
    id: bool,
    skip: bool,
    column: Option<String>,
    foreign_key: bool,
    foreign_key_name: Option<String>,
    one_to_one: bool,
    one_to_many: bool,
}

/// Parse a `DeriveInput` into a `ModelDef`.
pub fn parse_model(input: &DeriveInput) -> Result<ModelDef> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter(),
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Model requires a struct with named fields",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not unions",
            ));
        }
    };

    let name = input.ident.clone();
    let mut table = None;
    let mut orm_only = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("shillelagh") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("table") {
                if meta.input.peek(syn::Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    table = Some(checked_identifier(&value)?);
                } else {
                    table = Some(name.to_string());
                }
            } else if path.is_ident("orm_only") {
                let value: LitStr = meta.value()?.parse()?;
                orm_only = Some(value.parse::<Path>()?);
            } else {
                let attr_name = path.to_token_stream().to_string();
                return Err(Error::new_spanned(
                    path,
                    format!(
                        "unknown shillelagh attribute `{attr_name}`. \
                         Valid struct attributes are: table, orm_only"
                    ),
                ));
            }

            Ok(())
        })?;
    }

    let mut parsed = Vec::new();
    for field in fields {
        if let Some(def) = parse_field(field)? {
            parsed.push(def);
        }
    }

    let ids: Vec<_> = parsed
        .iter()
        .filter(|f| matches!(f.role, FieldRole::Id))
        .collect();
    if ids.len() > 1 {
        return Err(Error::new_spanned(
            &ids[1].name,
            "only one field can be marked #[shillelagh(id)]",
        ));
    }
    if table.is_some() && ids.is_empty() {
        return Err(Error::new_spanned(
            &input.ident,
            "a table model needs a field marked #[shillelagh(id)]",
        ));
    }

    Ok(ModelDef {
        name,
        table,
        orm_only,
        fields: parsed,
    })
}

/// Parse one field. Returns `None` for skipped fields.
fn parse_field(field: &Field) -> Result<Option<ModelFieldDef>> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("shillelagh") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("id") {
                attrs.id = true;
            } else if path.is_ident("skip") {
                attrs.skip = true;
            } else if path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.column = Some(checked_identifier(&value)?);
            } else if path.is_ident("one_to_one") {
                attrs.one_to_one = true;
            } else if path.is_ident("one_to_many") {
                attrs.one_to_many = true;
            } else if path.is_ident("foreign_key") {
                if meta.input.peek(syn::Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    attrs.foreign_key_name = Some(checked_identifier(&value)?);
                } else {
                    attrs.foreign_key = true;
                }
            } else {
                let attr_name = path.to_token_stream().to_string();
                return Err(Error::new_spanned(
                    path,
                    format!(
                        "unknown shillelagh attribute `{attr_name}`. \
                         Valid field attributes are: id, skip, column, one_to_one, \
                         one_to_many, foreign_key"
                    ),
                ));
            }

            Ok(())
        })?;
    }

    if attrs.skip {
        return Ok(None);
    }

    let markers = [attrs.id, attrs.one_to_one, attrs.one_to_many, attrs.foreign_key]
        .iter()
        .filter(|m| **m)
        .count();
    if markers > 1 {
        return Err(Error::new_spanned(
            field,
            "id, one_to_one, one_to_many and foreign_key are mutually exclusive",
        ));
    }
    if attrs.foreign_key_name.is_some() && !attrs.one_to_many {
        return Err(Error::new_spanned(
            field,
            "`foreign_key = \"...\"` names the child column of a one_to_many field",
        ));
    }

    let ty = &field.ty;
    let column = attrs.column.unwrap_or_else(|| name.to_string());

    let role = if attrs.id || attrs.foreign_key {
        let nullable = is_option_type(ty);
        let inner = extract_option_inner(ty).unwrap_or(ty);
        if last_segment(inner).as_deref() != Some("i64") {
            return Err(Error::new_spanned(
                ty,
                "id and foreign_key fields must be `i64` or `Option<i64>`",
            ));
        }
        if attrs.id {
            FieldRole::Id
        } else {
            FieldRole::ForeignKey { nullable }
        }
    } else if attrs.one_to_one {
        let nullable = is_option_type(ty);
        let inner = extract_option_inner(ty).unwrap_or(ty);
        let (target, boxed) = match extract_generic_inner(inner, "Box") {
            Some(target) => (target.clone(), true),
            None => (inner.clone(), false),
        };
        FieldRole::OneToOne {
            target,
            nullable,
            boxed,
        }
    } else if attrs.one_to_many {
        let target = extract_vec_inner(ty)
            .ok_or_else(|| Error::new_spanned(ty, "one_to_many fields must be `Vec<T>`"))?
            .clone();
        FieldRole::OneToMany {
            target,
            foreign_key: attrs.foreign_key_name,
        }
    } else {
        let nullable = is_option_type(ty);
        let inner = extract_option_inner(ty).unwrap_or(ty);
        FieldRole::Scalar {
            semantic: classify(inner),
            nullable,
        }
    };

    Ok(Some(ModelFieldDef { name, column, role }))
}

/// Read a string literal that must be a plain SQL identifier.
fn checked_identifier(lit: &LitStr) -> Result<String> {
    let value = lit.value();
    if is_valid_identifier(&value) {
        Ok(value)
    } else {
        Err(Error::new_spanned(
            lit,
            format!("`{value}` is not a valid SQL identifier"),
        ))
    }
}

/// Classify a scalar type from its syntax.
fn classify(ty: &Type) -> SemanticType {
    if extract_vec_inner(ty).and_then(last_segment).as_deref() == Some("u8") {
        return SemanticType::Bytes;
    }
    match last_segment(ty) {
        Some(ident) => TypeMapper::classify(&ident),
        None => SemanticType::Object,
    }
}

/// Name of the last path segment of a type, e.g. `DateTime` for `chrono::DateTime<Utc>`.
fn last_segment(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        if type_path.qself.is_none() {
            return type_path.path.segments.last().map(|s| s.ident.to_string());
        }
    }
    None
}

/// Check if a type is `Option<T>`.
fn is_option_type(ty: &Type) -> bool {
    extract_option_inner(ty).is_some()
}

/// Extract the inner type from `Option<T>`.
fn extract_option_inner(ty: &Type) -> Option<&Type> {
    extract_generic_inner(ty, "Option")
}

/// Extract the inner type from `Vec<T>`.
fn extract_vec_inner(ty: &Type) -> Option<&Type> {
    extract_generic_inner(ty, "Vec")
}

fn extract_generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == wrapper {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return Some(inner);
                    }
                }
            }
        }
    }
    None
}

/// Generate the Model trait implementation.
pub fn generate_model_impl(def: &ModelDef) -> TokenStream {
    let name = &def.name;

    let table = match &def.table {
        Some(table) => quote! { ::core::option::Option::Some(#table) },
        None => quote! { ::core::option::Option::None },
    };

    let orm_only = match &def.orm_only {
        Some(path) => quote! { #path() },
        None => quote! { ::core::default::Default::default() },
    };

    let field_infos: Vec<TokenStream> = def.fields.iter().map(generate_field_info).collect();
    let row_entries: Vec<TokenStream> = def.fields.iter().filter_map(generate_row_entry).collect();

    let id_field = def
        .fields
        .iter()
        .find(|f| matches!(f.role, FieldRole::Id))
        .map(|f| &f.name);
    let (row_id, set_row_id, reset_row_id) = match id_field {
        Some(id) => (
            quote! { ::shillelagh_core::RowId::row_id(&self.#id) },
            quote! { ::shillelagh_core::RowId::set_row_id(&mut self.#id, id); },
            quote! { ::shillelagh_core::RowId::reset_row_id(&mut self.#id, previous); },
        ),
        None => (
            quote! { ::core::option::Option::None },
            quote! { let _ = id; },
            quote! { let _ = previous; },
        ),
    };

    let replace_foreign_key = generate_replace_foreign_key(def);
    let related_mut = generate_related_mut(def);

    quote! {
        impl ::shillelagh_core::Model for #name {
            fn model_info() -> ::shillelagh_core::ModelInfo {
                static FIELDS: &[::shillelagh_core::FieldInfo] = &[
                    #(#field_infos),*
                ];
                ::shillelagh_core::ModelInfo::new::<Self>(#table, FIELDS)
            }

            fn orm_only() -> Self {
                #orm_only
            }

            fn info(&self) -> ::shillelagh_core::ModelInfo {
                <Self as ::shillelagh_core::Model>::model_info()
            }

            fn row_id(&self) -> ::core::option::Option<i64> {
                #row_id
            }

            fn set_row_id(&mut self, id: i64) {
                #set_row_id
            }

            fn reset_row_id(&mut self, previous: ::core::option::Option<i64>) {
                #reset_row_id
            }

            fn to_row(
                &self,
            ) -> ::shillelagh_core::Result<::std::vec::Vec<(&'static str, ::shillelagh_core::Value)>> {
                ::core::result::Result::Ok(::std::vec![
                    #(#row_entries),*
                ])
            }

            #replace_foreign_key

            #related_mut
        }
    }
}

/// Static `FieldInfo` for one field.
fn generate_field_info(field: &ModelFieldDef) -> TokenStream {
    let name = field.name.to_string();
    let column = &field.column;

    let kind = match &field.role {
        FieldRole::Id => quote! { ::shillelagh_core::FieldKind::Id },
        FieldRole::Scalar { semantic, nullable } => {
            let variant = format_ident!("{}", format!("{semantic:?}"));
            quote! {
                ::shillelagh_core::FieldKind::Scalar {
                    semantic: ::shillelagh_core::SemanticType::#variant,
                    nullable: #nullable,
                }
            }
        }
        FieldRole::ForeignKey { nullable } => {
            quote! { ::shillelagh_core::FieldKind::ForeignKey { nullable: #nullable } }
        }
        FieldRole::OneToOne {
            target, nullable, ..
        } => quote! {
            ::shillelagh_core::FieldKind::OneToOne {
                target: <#target as ::shillelagh_core::Model>::model_info,
                nullable: #nullable,
            }
        },
        FieldRole::OneToMany {
            target,
            foreign_key,
        } => {
            let foreign_key = match foreign_key {
                Some(fk) => quote! { ::core::option::Option::Some(#fk) },
                None => quote! { ::core::option::Option::None },
            };
            quote! {
                ::shillelagh_core::FieldKind::OneToMany {
                    target: <#target as ::shillelagh_core::Model>::model_info,
                    foreign_key: #foreign_key,
                }
            }
        }
    };

    quote! {
        ::shillelagh_core::FieldInfo::new(#name, #kind).column(#column)
    }
}

/// `(column, value)` entry of `to_row`. Id and one-to-many fields have none.
fn generate_row_entry(field: &ModelFieldDef) -> Option<TokenStream> {
    let name = &field.name;
    let column = &field.column;

    let value = match &field.role {
        FieldRole::Id | FieldRole::OneToMany { .. } => return None,
        FieldRole::Scalar {
            semantic: SemanticType::Object,
            nullable: true,
        } => quote! {
            match &self.#name {
                ::core::option::Option::Some(object) => ::shillelagh_core::encode_object(object)?,
                ::core::option::Option::None => ::shillelagh_core::Value::Null,
            }
        },
        FieldRole::Scalar {
            semantic: SemanticType::Object,
            nullable: false,
        } => quote! { ::shillelagh_core::encode_object(&self.#name)? },
        FieldRole::Scalar { .. } | FieldRole::ForeignKey { .. } => {
            quote! { ::shillelagh_core::ToValue::to_value(&self.#name) }
        }
        FieldRole::OneToOne {
            nullable: true,
            boxed,
            ..
        } => {
            let target = if *boxed {
                quote! { self.#name.as_deref() }
            } else {
                quote! { self.#name.as_ref() }
            };
            quote! {
                #target
                    .and_then(::shillelagh_core::Model::row_id)
                    .map_or(::shillelagh_core::Value::Null, ::shillelagh_core::Value::BigInt)
            }
        }
        FieldRole::OneToOne {
            nullable: false,
            boxed,
            ..
        } => {
            let target = if *boxed {
                quote! { &*self.#name }
            } else {
                quote! { &self.#name }
            };
            quote! {
                ::shillelagh_core::Model::row_id(#target)
                    .map_or(::shillelagh_core::Value::Null, ::shillelagh_core::Value::BigInt)
            }
        }
    };

    Some(quote! { (#column, #value) })
}

fn generate_replace_foreign_key(def: &ModelDef) -> TokenStream {
    let arms: Vec<TokenStream> = def
        .fields
        .iter()
        .filter(|f| matches!(f.role, FieldRole::ForeignKey { .. }))
        .map(|f| {
            let name = &f.name;
            let column = &f.column;
            quote! {
                #column => {
                    let previous = ::shillelagh_core::RowId::row_id(&self.#name);
                    ::shillelagh_core::RowId::reset_row_id(&mut self.#name, id);
                    ::core::option::Option::Some(previous)
                }
            }
        })
        .collect();

    if arms.is_empty() {
        return TokenStream::new();
    }

    quote! {
        fn replace_foreign_key(
            &mut self,
            column: &str,
            id: ::core::option::Option<i64>,
        ) -> ::core::option::Option<::core::option::Option<i64>> {
            match column {
                #(#arms)*
                _ => ::core::option::Option::None,
            }
        }
    }
}

fn generate_related_mut(def: &ModelDef) -> TokenStream {
    let arms: Vec<TokenStream> = def
        .fields
        .iter()
        .filter_map(|f| {
            let name = &f.name;
            let field_name = f.name.to_string();
            let body = match &f.role {
                FieldRole::OneToOne {
                    nullable: false,
                    boxed,
                    ..
                } => {
                    let target = if *boxed {
                        quote! { &mut *self.#name }
                    } else {
                        quote! { &mut self.#name }
                    };
                    quote! { ::shillelagh_core::Related::One(#target) }
                }
                FieldRole::OneToOne {
                    nullable: true,
                    boxed,
                    ..
                } => {
                    let target = if *boxed {
                        quote! { self.#name.as_deref_mut() }
                    } else {
                        quote! { self.#name.as_mut() }
                    };
                    quote! {
                        match #target {
                            ::core::option::Option::Some(target) => ::shillelagh_core::Related::One(target),
                            ::core::option::Option::None => ::shillelagh_core::Related::None,
                        }
                    }
                }
                FieldRole::OneToMany { .. } => quote! {
                    ::shillelagh_core::Related::Many(
                        self.#name
                            .iter_mut()
                            .map(|target| target as &mut dyn ::shillelagh_core::Model)
                            .collect(),
                    )
                },
                _ => return None,
            };
            Some(quote! { #field_name => #body, })
        })
        .collect();

    if arms.is_empty() {
        return TokenStream::new();
    }

    quote! {
        fn related_mut(&mut self, field: &str) -> ::shillelagh_core::Related<'_> {
            match field {
                #(#arms)*
                _ => ::shillelagh_core::Related::None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn parse(input: DeriveInput) -> ModelDef {
        parse_model(&input).unwrap()
    }

    #[test]
    fn test_is_option_type() {
        let ty: Type = parse_quote!(Option<String>);
        assert!(is_option_type(&ty));

        let ty: Type = parse_quote!(String);
        assert!(!is_option_type(&ty));
    }

    #[test]
    fn test_classify_from_syntax() {
        assert_eq!(classify(&parse_quote!(i16)), SemanticType::Int16);
        assert_eq!(classify(&parse_quote!(std::string::String)), SemanticType::Text);
        assert_eq!(classify(&parse_quote!(chrono::DateTime<Utc>)), SemanticType::Date);
        assert_eq!(classify(&parse_quote!(Vec<u8>)), SemanticType::Bytes);
        assert_eq!(classify(&parse_quote!(Vec<i32>)), SemanticType::Object);
        assert_eq!(classify(&parse_quote!([u8; 4])), SemanticType::Object);
    }

    #[test]
    fn test_table_defaults_to_struct_name() {
        let def = parse(parse_quote! {
            #[shillelagh(table)]
            struct TestPrimitiveTable {
                #[shillelagh(id)]
                id: i64,
                #[shillelagh(column = "aShort")]
                a_short: i16,
                #[shillelagh(skip)]
                cache: Vec<String>,
            }
        });
        assert_eq!(def.table.as_deref(), Some("TestPrimitiveTable"));
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.fields[1].column, "aShort");
        assert!(matches!(
            def.fields[1].role,
            FieldRole::Scalar {
                semantic: SemanticType::Int16,
                nullable: false
            }
        ));
    }

    #[test]
    fn test_relationship_roles() {
        let def = parse(parse_quote! {
            #[shillelagh(table = "Parents")]
            struct Parent {
                #[shillelagh(id)]
                id: Option<i64>,
                #[shillelagh(one_to_one)]
                favorite: Option<Child>,
                #[shillelagh(one_to_many, foreign_key = "owner")]
                children: Vec<Child>,
            }
        });
        assert_eq!(def.table.as_deref(), Some("Parents"));
        assert!(matches!(def.fields[1].role, FieldRole::OneToOne { nullable: true, .. }));
        match &def.fields[2].role {
            FieldRole::OneToMany {
                target,
                foreign_key,
            } => {
                assert_eq!(target.to_token_stream().to_string(), "Child");
                assert_eq!(foreign_key.as_deref(), Some("owner"));
            }
            other => panic!("unexpected role: {other:?}"),
        }
    }

    #[test]
    fn test_boxed_one_to_one_targets_inner_type() {
        let def = parse(parse_quote! {
            #[shillelagh(table)]
            struct Node {
                #[shillelagh(id)]
                id: Option<i64>,
                #[shillelagh(one_to_one)]
                next: Option<Box<Node>>,
            }
        });
        match &def.fields[1].role {
            FieldRole::OneToOne {
                target,
                nullable,
                boxed,
            } => {
                assert_eq!(target.to_token_stream().to_string(), "Node");
                assert!(*nullable);
                assert!(*boxed);
            }
            other => panic!("unexpected role: {other:?}"),
        }

        let tokens = generate_model_impl(&def).to_string();
        assert!(tokens.contains("as_deref_mut"));
        assert!(!tokens.contains("< Box < Node > as"));
    }

    #[test]
    fn test_orm_only_constructor() {
        let def = parse(parse_quote! {
            #[shillelagh(table, orm_only = "Self::blank")]
            struct Draft {
                #[shillelagh(id)]
                id: Option<i64>,
            }
        });
        assert_eq!(
            def.orm_only.as_ref().map(|p| p.to_token_stream().to_string()),
            Some("Self :: blank".to_string())
        );
        let tokens = generate_model_impl(&def).to_string();
        assert!(tokens.contains("Self :: blank ()"));
        assert!(!tokens.contains("Default :: default"));

        let plain = parse(parse_quote! {
            #[shillelagh(table)]
            struct Plain {
                #[shillelagh(id)]
                id: Option<i64>,
            }
        });
        assert!(plain.orm_only.is_none());
    }

    #[test]
    fn test_untabled_struct_needs_no_id() {
        let def = parse(parse_quote! {
            struct TestNotTableObject {
                name: String,
            }
        });
        assert!(def.table.is_none());
        assert!(def.fields.iter().all(|f| !matches!(f.role, FieldRole::Id)));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let duplicate: DeriveInput = parse_quote! {
            #[shillelagh(table)]
            struct Twice {
                #[shillelagh(id)]
                a: i64,
                #[shillelagh(id)]
                b: i64,
            }
        };
        assert!(parse_model(&duplicate).is_err());

        let missing: DeriveInput = parse_quote! {
            #[shillelagh(table)]
            struct NoId {
                a: i32,
            }
        };
        assert!(parse_model(&missing).is_err());

        let bad_many: DeriveInput = parse_quote! {
            #[shillelagh(table)]
            struct BadMany {
                #[shillelagh(id)]
                id: i64,
                #[shillelagh(one_to_many)]
                children: Option<Child>,
            }
        };
        assert!(parse_model(&bad_many).is_err());

        let bad_name: DeriveInput = parse_quote! {
            #[shillelagh(table = "drop table")]
            struct BadName {
                #[shillelagh(id)]
                id: i64,
            }
        };
        assert!(parse_model(&bad_name).is_err());

        let generic: DeriveInput = parse_quote! {
            #[shillelagh(table)]
            struct Wrapper<T> {
                #[shillelagh(id)]
                id: i64,
                inner: T,
            }
        };
        assert!(parse_model(&generic).is_err());
    }

    #[test]
    fn test_generated_impl_mentions_every_column() {
        let def = parse(parse_quote! {
            #[shillelagh(table)]
            struct Child {
                #[shillelagh(id)]
                id: i64,
                name: String,
                #[shillelagh(foreign_key)]
                parent_id: Option<i64>,
            }
        });
        let tokens = generate_model_impl(&def).to_string();
        assert!(tokens.contains("\"name\""));
        assert!(tokens.contains("fn replace_foreign_key"));
        assert!(!tokens.contains("fn related_mut"));
    }
}
