//! `#[base_entity]` composes the shared record columns (`id`, `created_at`,
//! `updated_at`) into a sea-orm model and implements the record traits for it.
//!
//! ```ignore
//! #[base_entity]
//! #[sea_orm::model]
//! #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
//! #[sea_orm(table_name = "users")]
//! pub struct Model {
//!     pub email: String,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{
    Expr, ExprLit, Fields, FieldsNamed, Ident, ItemStruct, Lit, Meta, Path, Token,
    parse_macro_input, parse_str, punctuated::Punctuated,
};

struct RecordConfig {
    record_path: Path,
    active_model_ident: Ident,
    id_field: Ident,
    created_at_field: Ident,
    updated_at_field: Ident,
}

impl Default for RecordConfig {
    fn default() -> Self {
        let span = proc_macro2::Span::call_site();
        Self {
            record_path: parse_str("crate::db::record").expect("default record path should parse"),
            active_model_ident: Ident::new("ActiveModel", span),
            id_field: Ident::new("id", span),
            created_at_field: Ident::new("created_at", span),
            updated_at_field: Ident::new("updated_at", span),
        }
    }
}

#[proc_macro_attribute]
pub fn base_entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated<Meta, Token![,]>::parse_terminated);
    let mut config = RecordConfig::default();
    if let Err(err) = apply_args(&mut config, args) {
        return err.to_compile_error().into();
    }

    let mut input = parse_macro_input!(item as ItemStruct);
    let Fields::Named(fields) = &mut input.fields else {
        return syn::Error::new_spanned(input, "base_entity requires a struct with named fields")
            .to_compile_error()
            .into();
    };

    prepend_record_fields(fields, &config);

    let record_path = config.record_path;
    let active_model = config.active_model_ident;
    let id_field = config.id_field;
    let created_at_field = config.created_at_field;
    let updated_at_field = config.updated_at_field;
    let created_at_column = Ident::new(&column_variant(&created_at_field), created_at_field.span());

    let expanded = quote! {
        #input

        impl #record_path::RecordActiveModel for #active_model {
            fn assign_id(&mut self, id: uuid::Uuid) {
                self.#id_field = sea_orm::ActiveValue::Set(id);
            }

            fn stamp_created(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                self.#created_at_field = sea_orm::ActiveValue::Set(ts);
                self.#updated_at_field = sea_orm::ActiveValue::Set(ts);
            }

            fn stamp_updated(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone) {
                self.#updated_at_field = sea_orm::ActiveValue::Set(ts);
            }
        }

        impl #record_path::RecordEntity for Entity {
            fn created_at_column() -> Column {
                Column::#created_at_column
            }
        }
    };

    expanded.into()
}

/// Record columns go first so every table starts with the same layout.
/// Fields the struct already declares are left untouched.
fn prepend_record_fields(fields: &mut FieldsNamed, config: &RecordConfig) {
    let existing: HashSet<String> = fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| ident.to_string()))
        .collect();

    let mut record_fields: Punctuated<syn::Field, Token![,]> = Punctuated::new();

    let id_ident = &config.id_field;
    if !existing.contains(&id_ident.to_string()) {
        record_fields.push(syn::parse_quote! {
            #[sea_orm(primary_key, auto_increment = false)]
            pub #id_ident: uuid::Uuid
        });
    }

    for ident in [&config.created_at_field, &config.updated_at_field] {
        if !existing.contains(&ident.to_string()) {
            record_fields.push(syn::parse_quote! {
                #[sea_orm(default_expr = "Expr::current_timestamp()")]
                pub #ident: sea_orm::entity::prelude::DateTimeWithTimeZone
            });
        }
    }

    record_fields.extend(fields.named.iter().cloned());
    fields.named = record_fields;
}

/// sea-orm names column variants in UpperCamelCase after the field.
fn column_variant(field: &Ident) -> String {
    field
        .to_string()
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn apply_args(config: &mut RecordConfig, args: Punctuated<Meta, Token![,]>) -> syn::Result<()> {
    for meta in args {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "expected name-value pair, e.g. record = \"path::to::record\"",
            ));
        };

        let Some(ident) = name_value.path.get_ident() else {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "expected simple identifier for attribute key",
            ));
        };

        let Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) = name_value.value
        else {
            return Err(syn::Error::new_spanned(
                name_value.value,
                "expected string literal for attribute value",
            ));
        };

        match ident.to_string().as_str() {
            "record" => {
                config.record_path = value.parse::<Path>().map_err(|err| {
                    syn::Error::new(value.span(), format!("invalid record path: {err}"))
                })?;
            }
            "active_model" => config.active_model_ident = Ident::new(&value.value(), value.span()),
            "id" => config.id_field = Ident::new(&value.value(), value.span()),
            "created_at" => config.created_at_field = Ident::new(&value.value(), value.span()),
            "updated_at" => config.updated_at_field = Ident::new(&value.value(), value.span()),
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown base_entity attribute key",
                ));
            }
        }
    }

    Ok(())
}
