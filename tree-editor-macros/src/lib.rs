use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{parse_macro_input, spanned::Spanned, Attribute, Data, DeriveInput, Fields, Ident, Type};

#[proc_macro_derive(TreeEditorModel, attributes(tree_editor))]
pub fn derive_tree_editor_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_tree_editor_model(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct Options {
    id_field: Option<String>,
    id_type: Option<Type>,
    parent_field: Option<String>,
    tree_id_field: Option<String>,
    left_field: Option<String>,
    right_field: Option<String>,
    level_field: Option<String>,
    label_field: Option<String>,
    app_label: Option<String>,
    object_name: Option<String>,
    verbose_name: Option<String>,
    advisory_lock: Option<bool>,
}

fn impl_tree_editor_model(input: &DeriveInput) -> syn::Result<TokenStream> {
    let struct_ident = &input.ident;

    let data_struct = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "TreeEditorModel can only be derived for structs",
            ))
        }
    };

    let mut options = Options::default();
    let mut table_name: Option<String> = None;

    for attr in &input.attrs {
        if attr.path().is_ident("tree_editor") {
            parse_tree_editor_attr(attr, &mut options)?;
        }

        if attr.path().is_ident("sea_orm") {
            if let Some(name) = parse_sea_orm_table_name(attr)? {
                table_name = Some(name);
            }
        }
    }

    let id_field_name = options.id_field.unwrap_or_else(|| "id".to_string());
    let parent_field_name = options
        .parent_field
        .unwrap_or_else(|| "parent_id".to_string());
    let tree_id_field_name = options
        .tree_id_field
        .unwrap_or_else(|| "tree_id".to_string());
    let left_field_name = options.left_field.unwrap_or_else(|| "lft".to_string());
    let right_field_name = options.right_field.unwrap_or_else(|| "rght".to_string());
    let level_field_name = options.level_field.unwrap_or_else(|| "level".to_string());
    let label_field_name = options.label_field.unwrap_or_else(|| "name".to_string());

    let id_field_ident = Ident::new(&id_field_name, struct_ident.span());
    let parent_field_ident = Ident::new(&parent_field_name, struct_ident.span());
    let tree_id_field_ident = Ident::new(&tree_id_field_name, struct_ident.span());
    let left_field_ident = Ident::new(&left_field_name, struct_ident.span());
    let right_field_ident = Ident::new(&right_field_name, struct_ident.span());
    let level_field_ident = Ident::new(&level_field_name, struct_ident.span());
    let label_field_ident = Ident::new(&label_field_name, struct_ident.span());

    let mut id_field_type: Option<Type> = options.id_type.clone();
    let mut displayed_names = Vec::new();
    let mut displayed_idents = Vec::new();

    if let Fields::Named(ref fields) = data_struct.fields {
        for field in &fields.named {
            if let Some(ident) = &field.ident {
                if ident == &id_field_ident && id_field_type.is_none() {
                    id_field_type = Some(field.ty.clone());
                }
                if !is_skipped(&field.attrs)? {
                    displayed_names.push(syn::LitStr::new(&ident.unraw().to_string(), ident.span()));
                    displayed_idents.push(ident.clone());
                }
            }
        }
    } else {
        return Err(syn::Error::new(
            data_struct.fields.span(),
            "TreeEditorModel requires named fields",
        ));
    }

    let id_type = id_field_type.ok_or_else(|| {
        syn::Error::new(
            struct_ident.span(),
            "Unable to determine id field type; specify `id_type = ...` in #[tree_editor]",
        )
    })?;

    let base_table = table_name.unwrap_or_else(|| struct_ident.unraw().to_string());
    let app_label = options.app_label.unwrap_or_else(|| "admin".to_string());

    let id_column_variant = format_ident!("{}", to_pascal_case(&id_field_name));
    let parent_column_variant = format_ident!("{}", to_pascal_case(&parent_field_name));
    let tree_id_column_variant = format_ident!("{}", to_pascal_case(&tree_id_field_name));
    let left_column_variant = format_ident!("{}", to_pascal_case(&left_field_name));
    let right_column_variant = format_ident!("{}", to_pascal_case(&right_field_name));
    let level_column_variant = format_ident!("{}", to_pascal_case(&level_field_name));

    let table_literal = syn::LitStr::new(&base_table, struct_ident.span());
    let app_label_literal = syn::LitStr::new(&app_label, struct_ident.span());

    let object_name_option = options.object_name.map(|name| {
        let literal = syn::LitStr::new(&name, struct_ident.span());
        quote! { .object_name(#literal) }
    });
    let verbose_name_option = options.verbose_name.map(|name| {
        let literal = syn::LitStr::new(&name, struct_ident.span());
        quote! { .verbose_name(#literal) }
    });
    let lock_option = match options.advisory_lock {
        Some(false) => Some(quote! {
            .advisory_lock_strategy(::tree_editor::AdvisoryLockStrategy::Disabled)
        }),
        _ => None,
    };

    let generated = quote! {
        impl ::tree_editor::TreeEditorModel for #struct_ident {
            type Entity = Entity;
            type ActiveModel = ActiveModel;
            type Id = #id_type;

            fn tree_editor_config() -> &'static ::tree_editor::TreeEditorConfig {
                static CONFIG: ::tree_editor::__private::once_cell::sync::Lazy<
                    ::tree_editor::TreeEditorConfig,
                > = ::tree_editor::__private::once_cell::sync::Lazy::new(|| {
                    let base = ::tree_editor::TreeEditorConfig::new(
                        #app_label_literal,
                        #table_literal,
                    );
                    ::tree_editor::TreeEditorOptions::default()
                        #object_name_option
                        #verbose_name_option
                        #lock_option
                        .apply(base)
                });
                &CONFIG
            }

            fn id(&self) -> Self::Id {
                self.#id_field_ident.clone()
            }

            fn parent_id(&self) -> Option<Self::Id> {
                self.#parent_field_ident.clone()
            }

            fn tree_id(&self) -> i32 {
                self.#tree_id_field_ident
            }

            fn left(&self) -> i32 {
                self.#left_field_ident
            }

            fn right(&self) -> i32 {
                self.#right_field_ident
            }

            fn level(&self) -> i32 {
                self.#level_field_ident
            }

            fn label(&self) -> String {
                ::std::string::ToString::to_string(&self.#label_field_ident)
            }

            fn field_value(&self, field: &str) -> Option<::tree_editor::FieldValue> {
                match field {
                    #(
                        #displayed_names => Some(::tree_editor::FieldValue::from(
                            ::std::clone::Clone::clone(&self.#displayed_idents),
                        )),
                    )*
                    _ => None,
                }
            }

            fn id_to_value(id: &Self::Id) -> ::sea_orm::Value {
                ::sea_orm::Value::from(id.clone())
            }

            fn parent_to_value(parent: Option<&Self::Id>) -> ::sea_orm::Value {
                ::sea_orm::Value::from(parent.cloned())
            }

            fn id_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#id_column_variant
            }

            fn parent_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#parent_column_variant
            }

            fn tree_id_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#tree_id_column_variant
            }

            fn left_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#left_column_variant
            }

            fn right_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#right_column_variant
            }

            fn level_column() -> <Self::Entity as ::sea_orm::EntityTrait>::Column {
                Column::#level_column_variant
            }
        }
    };

    Ok(generated.into())
}

fn parse_tree_editor_attr(attr: &Attribute, options: &mut Options) -> syn::Result<()> {
    attr.parse_nested_meta(|meta| {
        let ident = meta
            .path
            .get_ident()
            .ok_or_else(|| syn::Error::new(meta.path.span(), "Invalid option key"))?
            .to_string();

        match ident.as_str() {
            "id_type" => {
                let ty: Type = meta.value()?.parse()?;
                options.id_type = Some(ty);
            }
            "advisory_lock" => {
                let value: syn::LitBool = meta.value()?.parse()?;
                options.advisory_lock = Some(value.value());
            }
            other => {
                let slot = match other {
                    "id_field" => &mut options.id_field,
                    "parent_field" => &mut options.parent_field,
                    "tree_id_field" => &mut options.tree_id_field,
                    "left_field" => &mut options.left_field,
                    "right_field" => &mut options.right_field,
                    "level_field" => &mut options.level_field,
                    "label_field" => &mut options.label_field,
                    "app_label" => &mut options.app_label,
                    "object_name" => &mut options.object_name,
                    "verbose_name" => &mut options.verbose_name,
                    _ => {
                        return Err(syn::Error::new(
                            meta.path.span(),
                            format!("Unsupported tree_editor option `{other}`"),
                        ));
                    }
                };
                let value: syn::LitStr = meta.value()?.parse()?;
                *slot = Some(value.value());
            }
        }

        Ok(())
    })
}

fn is_skipped(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skipped = false;
    for attr in attrs {
        if !attr.path().is_ident("tree_editor") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skipped = true;
                Ok(())
            } else {
                Err(syn::Error::new(
                    meta.path.span(),
                    "Unsupported tree_editor field option; expected `skip`",
                ))
            }
        })?;
    }
    Ok(skipped)
}

fn parse_sea_orm_table_name(attr: &Attribute) -> syn::Result<Option<String>> {
    let mut table_name: Option<String> = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("table_name") {
            let value: syn::LitStr = meta.value()?.parse()?;
            table_name = Some(value.value());
        } else if meta.input.peek(syn::Token![=]) {
            let _: syn::Expr = meta.value()?.parse()?;
        }
        Ok(())
    })?;
    Ok(table_name)
}

fn to_pascal_case(value: &str) -> String {
    value
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
