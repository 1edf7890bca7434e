use crate::utils::{apply_derives, ensure_required_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Item, ItemStruct, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input,
};

/// #[aggregate] 宏实现
/// - 追加字段（若缺失）并置于最前：`id: IdType`、`version: usize`、
///   `uncommitted: Vec<EventEnvelope<EventType>>`
/// - 自动实现 `::eventus_domain::entity::Entity`（new/id/version）
///   与 `::eventus_domain::entity::EventSourced`（版本写入、未提交事件）
/// - 支持参数：`#[aggregate(id = IdType, event = EventType, debug = true|false)]`；
///   - `id` 默认 `String`
///   - `event` 必填
///   - `debug` 默认 `true`（派生 Debug）。当为 `false` 时不派生 Debug，便于用户自定义实现。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as AggregateAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[aggregate] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let Some(event_type) = cfg.event_ty else {
        return syn::Error::new(
            st.ident.span(),
            "#[aggregate] requires the event type, e.g. #[aggregate(event = AccountEvent)]",
        )
        .to_compile_error()
        .into();
    };

    // 仅支持具名字段结构体
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type = cfg.id_ty.unwrap_or_else(|| syn::parse_quote! { String });

    let usize_ty: Type = syn::parse_quote! { usize };
    let uncommitted_ty: Type = syn::parse_quote! {
        ::std::vec::Vec<::eventus_domain::domain_event::EventEnvelope<#event_type>>
    };
    ensure_required_fields(
        fields_named,
        &[
            ("id", &id_type),
            ("version", &usize_ty),
            ("uncommitted", &uncommitted_ty),
        ],
    );

    // 合并/规范 derive：默认添加 Debug（可通过 debug=false 关闭）、Clone、Default
    let mut required: Vec<syn::Path> = vec![syn::parse_quote!(Clone), syn::parse_quote!(Default)];
    if cfg.derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let out_struct = ItemStruct { ..st };

    let ident = &out_struct.ident;
    let generics = out_struct.generics.clone();
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expanded = quote! {
        #out_struct

        impl #impl_generics ::eventus_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            fn new(aggregate_id: Self::Id) -> Self {
                Self {
                    id: aggregate_id,
                    version: 0,
                    uncommitted: ::std::vec::Vec::new(),
                    ..::std::default::Default::default()
                }
            }

            fn id(&self) -> &Self::Id { &self.id }

            fn version(&self) -> usize { self.version }
        }

        impl #impl_generics ::eventus_domain::entity::EventSourced for #ident #ty_generics #where_clause {
            type Event = #event_type;

            fn set_version(&mut self, version: usize) { self.version = version; }

            fn uncommitted_events(&self) -> &[::eventus_domain::domain_event::EventEnvelope<Self::Event>] {
                &self.uncommitted
            }

            fn uncommitted_events_mut(
                &mut self,
            ) -> &mut ::std::vec::Vec<::eventus_domain::domain_event::EventEnvelope<Self::Event>> {
                &mut self.uncommitted
            }
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

struct AggregateAttrConfig {
    id_ty: Option<Type>,
    event_ty: Option<Type>,
    derive_debug: Option<bool>,
}

impl Parse for AggregateAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self {
            id_ty: None,
            event_ty: None,
            derive_debug: None,
        };

        if input.is_empty() {
            return Ok(cfg);
        }

        let elems: Punctuated<AggregateAttrElem, Token![,]> =
            Punctuated::<AggregateAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems.into_iter() {
            match elem {
                AggregateAttrElem::Id(ty) => {
                    if cfg.id_ty.is_some() {
                        return Err(syn::Error::new(
                            ty.span(),
                            "duplicate key 'id' in attribute",
                        ));
                    }
                    cfg.id_ty = Some(*ty);
                }
                AggregateAttrElem::Event(ty) => {
                    if cfg.event_ty.is_some() {
                        return Err(syn::Error::new(
                            ty.span(),
                            "duplicate key 'event' in attribute",
                        ));
                    }
                    cfg.event_ty = Some(*ty);
                }
                AggregateAttrElem::Debug(b) => {
                    if cfg.derive_debug.is_some() {
                        return Err(syn::Error::new(
                            proc_macro2::Span::call_site(),
                            "duplicate key 'debug' in attribute",
                        ));
                    }
                    cfg.derive_debug = Some(b);
                }
            }
        }

        Ok(cfg)
    }
}

enum AggregateAttrElem {
    Id(Box<Type>),
    Event(Box<Type>),
    Debug(bool),
}

impl Parse for AggregateAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        if key == "id" {
            Ok(AggregateAttrElem::Id(Box::new(input.parse()?)))
        } else if key == "event" {
            Ok(AggregateAttrElem::Event(Box::new(input.parse()?)))
        } else if key == "debug" {
            let expr: syn::Expr = input.parse()?;
            match expr {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Bool(b),
                    ..
                }) => Ok(AggregateAttrElem::Debug(b.value())),
                other => Err(syn::Error::new(
                    other.span(),
                    "expected boolean literal for 'debug'",
                )),
            }
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'id', 'event' or 'debug'",
            ))
        }
    }
}
