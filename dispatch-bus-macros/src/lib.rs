//! Procedural macros for dispatch-bus

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Display name override, defaults to the variant name
    #[darling(default)]
    name: Option<String>,

    /// Outcome channel override, defaults to the action name
    #[darling(default)]
    channel: Option<String>,
}

impl ActionVariant {
    fn pattern(&self, enum_name: &syn::Ident) -> TokenStream2 {
        let variant = &self.ident;
        match self.fields.style {
            darling::ast::Style::Unit => quote! { #enum_name::#variant },
            darling::ast::Style::Tuple => quote! { #enum_name::#variant(..) },
            darling::ast::Style::Struct => quote! { #enum_name::#variant { .. } },
        }
    }

    fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.ident.to_string())
    }
}

/// Derive macro for the Action trait
///
/// Generates a `name()` method returning the variant name, or the
/// `#[action(name = "...")]` override, as a static string.
///
/// When any variant carries `#[action(channel = "...")]`, also generates
/// `channel()`. Variants without the attribute use their name.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum AppAction {
///     #[action(name = "[Data] Load data")]
///     DataLoad,
///     #[action(name = "[Data] Data loaded", channel = "[Data] Load data")]
///     DataDidLoad(Vec<u32>),
///     Quit,
/// }
///
/// assert_eq!(AppAction::DataLoad.name(), "[Data] Load data");
/// assert_eq!(AppAction::Quit.name(), "Quit");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    if variants.is_empty() {
        return syn::Error::new_spanned(&input, "Action needs at least one variant")
            .to_compile_error()
            .into();
    }

    let name_arms = variants.iter().map(|v| {
        let pattern = v.pattern(name);
        let action_name = v.name();
        quote! { #pattern => #action_name }
    });

    let channel_fn = if variants.iter().any(|v| v.channel.is_some()) {
        let channel_arms = variants.iter().map(|v| {
            let pattern = v.pattern(name);
            let channel = v.channel.clone().unwrap_or_else(|| v.name());
            quote! { #pattern => dispatch_bus::ChannelName::from(#channel) }
        });
        quote! {
            fn channel(&self) -> dispatch_bus::ChannelName {
                match self {
                    #(#channel_arms),*
                }
            }
        }
    } else {
        TokenStream2::new()
    };

    let expanded = quote! {
        impl #impl_generics dispatch_bus::Action for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }

            #channel_fn
        }
    };

    TokenStream::from(expanded)
}
