use syn::meta::ParseNestedMeta;
use syn::{Attribute, Error, ExprPath, LitStr, Result, Token};

pub enum DefaultDefinition {
    Default,
    Expr(ExprPath),
}

#[derive(Default)]
pub struct FieldAttributes {
    pub tag: Option<LitStr>,
    pub default: Option<DefaultDefinition>,
    pub setter: bool,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self> {
        let mut attributes = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                attributes.tag = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    let value = meta.value()?;
                    let expr: LitStr = value.parse()?;
                    attributes.default = Some(DefaultDefinition::Expr(expr.parse()?));
                } else {
                    attributes.default = Some(DefaultDefinition::Default);
                }
            } else if meta.path.is_ident("setter") {
                attributes.setter = true;
            } else {
                return Err(meta.error("unsupported bean field attribute"));
            }

            Ok(())
        })?;

        Ok(attributes)
    }
}

#[derive(Default)]
pub struct BeanAttributes {
    pub closeable: bool,
    pub setters: bool,
}

impl TryFrom<&Attribute> for BeanAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self> {
        let mut attributes = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("closeable") {
                attributes.closeable = true;
            } else if meta.path.is_ident("setters") {
                attributes.setters = true;
            } else {
                return Err(meta.error("unsupported bean attribute"));
            }

            Ok(())
        })?;

        Ok(attributes)
    }
}

#[derive(Default)]
pub struct ProviderAttributes {
    pub name: Option<LitStr>,
    pub hold_by_user: bool,
}

impl ProviderAttributes {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> Result<()> {
        if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("hold_by_user") {
            self.hold_by_user = true;
        } else {
            return Err(meta.error("unsupported provider attribute"));
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct InjectableAttributes {
    pub closeable: bool,
}

impl InjectableAttributes {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> Result<()> {
        if meta.path.is_ident("closeable") {
            self.closeable = true;
        } else {
            return Err(meta.error("unsupported injectable attribute"));
        }

        Ok(())
    }
}
