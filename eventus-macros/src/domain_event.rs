use crate::utils::apply_derives;
use proc_macro::TokenStream;
use quote::{ToTokens, format_ident, quote};
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Ident, Item, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_event] 宏实现
/// - 仅支持具名字段变体：`Variant { .. }`（允许空字段 `Variant {}`）
/// - 生成与枚举同可见性的 `{Enum}Kind` 种类枚举（无载荷，`Copy + Eq + Hash`），
///   作为聚合处理器注册表与读模型订阅的键
/// - 生成 `::eventus_domain::domain_event::DomainEvent` 实现（kind/event_type/event_version）
/// - 支持：`#[domain_event(version = N)]`（枚举级默认版本号，默认 1）
/// - 变体可覆写：`#[event(event_type = "...", event_version = N)]`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on enum types",
            )
            .to_compile_error()
            .into();
        }
    };

    if !enum_item.generics.params.is_empty() {
        return syn::Error::new(
            enum_item.generics.span(),
            "#[domain_event] does not support generic enums",
        )
        .to_compile_error()
        .into();
    }

    if enum_item.variants.is_empty() {
        return syn::Error::new(
            enum_item.ident.span(),
            "#[domain_event] requires at least one variant",
        )
        .to_compile_error()
        .into();
    }

    let version_lit = cfg.version.unwrap_or_else(|| syn::parse_quote! { 1 });

    // 合并/追加默认派生：Debug, Clone, PartialEq, Serialize, Deserialize
    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    apply_derives(&mut enum_item.attrs, required);

    let mut variant_types: HashMap<String, syn::LitStr> = HashMap::new();
    let mut variant_versions: HashMap<String, syn::LitInt> = HashMap::new();

    for v in &mut enum_item.variants {
        if !matches!(v.fields, syn::Fields::Named(_)) {
            return syn::Error::new(
                v.span(),
                "#[domain_event] supports only named-field enum variants, e.g., Variant { x: T }",
            )
            .to_compile_error()
            .into();
        }

        let mut retained_attrs = Vec::new();
        let mut type_lit: Option<syn::LitStr> = None;
        let mut version_lit_local: Option<syn::LitInt> = None;

        for attr in v.attrs.iter() {
            if attr.path().is_ident("event") {
                let vc = match parse_variant_event_attr(attr) {
                    Ok(vc) => vc,
                    Err(err) => return err.to_compile_error().into(),
                };
                if let Some(lit) = vc.ty {
                    if type_lit.is_some() {
                        return syn::Error::new(
                            attr.span(),
                            "duplicate 'event_type' specified for this variant",
                        )
                        .to_compile_error()
                        .into();
                    }
                    type_lit = Some(lit);
                }
                if let Some(lit) = vc.version {
                    if version_lit_local.is_some() {
                        return syn::Error::new(
                            attr.span(),
                            "duplicate 'event_version' specified for this variant",
                        )
                        .to_compile_error()
                        .into();
                    }
                    version_lit_local = Some(lit);
                }
            } else {
                retained_attrs.push(attr.clone());
            }
        }

        v.attrs = retained_attrs;
        if let Some(lit) = type_lit {
            variant_types.insert(v.ident.to_string(), lit);
        }
        if let Some(lit) = version_lit_local {
            variant_versions.insert(v.ident.to_string(), lit);
        }
    }

    let enum_ident = &enum_item.ident;
    let enum_name_string = enum_ident.to_string();
    let vis = &enum_item.vis;
    let kind_ident = format_ident!("{}Kind", enum_ident);
    let variant_idents: Vec<&Ident> = enum_item.variants.iter().map(|v| &v.ident).collect();

    // 事件类型标签：变体级覆盖或默认 EnumName.Variant
    let type_lits: Vec<syn::LitStr> = variant_idents
        .iter()
        .map(|v_ident| {
            variant_types.get(&v_ident.to_string()).cloned().unwrap_or_else(|| {
                syn::LitStr::new(&format!("{}.{}", enum_name_string, v_ident), v_ident.span())
            })
        })
        .collect();

    let ver_match_arms = variant_idents.iter().map(|v_ident| {
        match variant_versions.get(&v_ident.to_string()) {
            Some(lit) => quote! { Self::#v_ident { .. } => #lit },
            None => quote! { Self::#v_ident { .. } => #version_lit },
        }
    });

    let kind_doc = format!("`{}` 的事件种类", enum_name_string);

    let out = quote! {
        #enum_item

        #[doc = #kind_doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #kind_ident {
            #( #variant_idents, )*
        }

        impl #kind_ident {
            pub const ALL: &'static [Self] = &[ #( Self::#variant_idents, )* ];

            pub const fn as_str(&self) -> &'static str {
                match self { #( Self::#variant_idents => #type_lits, )* }
            }
        }

        impl ::std::fmt::Display for #kind_ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::eventus_domain::domain_event::DomainEvent for #enum_ident {
            type Kind = #kind_ident;

            fn kind(&self) -> Self::Kind {
                match self { #( Self::#variant_idents { .. } => #kind_ident::#variant_idents, )* }
            }

            fn event_type(&self) -> &'static str { self.kind().as_str() }

            fn event_version(&self) -> usize { match self { #( #ver_match_arms, )* } }
        }
    };

    TokenStream::from(out)
}

// -------- utils & parsing --------

struct VariantEventAttrConfig {
    ty: Option<syn::LitStr>,
    version: Option<syn::LitInt>,
}

fn parse_variant_event_attr(attr: &syn::Attribute) -> Result<VariantEventAttrConfig> {
    match &attr.meta {
        syn::Meta::List(_) => {
            let mut ty: Option<syn::LitStr> = None;
            let mut version: Option<syn::LitInt> = None;
            let pairs: Punctuated<VariantEventAttrKv, Token![,]> = attr
                .parse_args_with(Punctuated::<VariantEventAttrKv, Token![,]>::parse_terminated)?;

            for kv in pairs {
                match kv.key.to_string().as_str() {
                    "event_type" => {
                        if ty.is_some() {
                            return Err(syn::Error::new(
                                kv.key.span(),
                                "duplicate key 'event_type' in attribute",
                            ));
                        }
                        let lit = match kv.value {
                            Expr::Lit(syn::ExprLit {
                                lit: syn::Lit::Str(lit),
                                ..
                            }) => lit,
                            other => {
                                return Err(syn::Error::new(
                                    other.span(),
                                    "expected string literal for 'event_type'",
                                ));
                            }
                        };
                        ty = Some(lit);
                    }
                    "event_version" => {
                        if version.is_some() {
                            return Err(syn::Error::new(
                                kv.key.span(),
                                "duplicate key 'event_version' in attribute",
                            ));
                        }
                        let lit = match kv.value {
                            Expr::Lit(syn::ExprLit {
                                lit: syn::Lit::Int(lit),
                                ..
                            }) => lit,
                            other => {
                                return Err(syn::Error::new(
                                    other.span(),
                                    "expected integer literal for 'event_version'",
                                ));
                            }
                        };
                        version = Some(lit);
                    }
                    _ => {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "unknown key; expected 'event_type' | 'event_version'",
                        ));
                    }
                }
            }

            Ok(VariantEventAttrConfig { ty, version })
        }
        other => Err(syn::Error::new(other.span(), "expected #[event(...)]")),
    }
}

struct VariantEventAttrKv {
    key: Ident,
    value: Expr,
}

impl Parse for VariantEventAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value = input.parse()?;
        Ok(Self { key, value })
    }
}

// 枚举级配置：默认版本号
struct EventAttrConfig {
    version: Option<syn::LitInt>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut version: Option<syn::LitInt> = None;

        if input.is_empty() {
            return Ok(Self { version });
        }

        let pairs: Punctuated<syn::ExprAssign, Token![,]> =
            Punctuated::<syn::ExprAssign, Token![,]>::parse_terminated(input)?;

        for assign in pairs.into_iter() {
            let key_ident = match *assign.left {
                syn::Expr::Path(p) if p.path.segments.len() == 1 => {
                    p.path.segments[0].ident.clone()
                }
                other => return Err(syn::Error::new(other.span(), "invalid attribute key")),
            };
            match key_ident.to_string().as_str() {
                "version" => {
                    if version.is_some() {
                        return Err(syn::Error::new(
                            key_ident.span(),
                            "duplicate key 'version' in attribute",
                        ));
                    }
                    let lit: syn::LitInt = syn::parse2(assign.right.to_token_stream())?;
                    version = Some(lit);
                }
                _ => {
                    return Err(syn::Error::new(
                        key_ident.span(),
                        "unknown key; expected 'version'",
                    ));
                }
            }
        }

        Ok(Self { version })
    }
}
