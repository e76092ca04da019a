//! 定义注册表
//!
//! 负责候选选择与解析计划：
//! 1. 名称精确匹配
//! 2. 限定符匹配
//! 3. 候选中唯一的 primary
//! 4. 仍然无法确定时报错
//!
//! 解析计划在构造任何实例之前完成，缺失、歧义和循环依赖都在这一步失败。

use super::definition::{DefinitionKey, Dependency, ErasedInstance, ServiceDefinition};
use super::error::ContainerError;
use super::ServiceLifetime;
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// 已注册的定义及其单例槽位
pub(crate) struct RegisteredDefinition {
    pub(crate) id: usize,
    pub(crate) definition: ServiceDefinition,
    /// 每个定义一把锁，保护“检查缓存 / 创建 / 写入缓存”整个过程
    pub(crate) singleton: Mutex<Option<ErasedInstance>>,
}

impl RegisteredDefinition {
    pub(crate) fn name(&self) -> &str {
        self.definition.name()
    }

    pub(crate) fn lifetime(&self) -> ServiceLifetime {
        self.definition.lifetime()
    }

    /// 不阻塞地检查单例是否已缓存；正在创建中的视为未缓存
    fn is_cached(&self) -> bool {
        self.singleton
            .try_lock()
            .map_or(false, |slot| slot.is_some())
    }

    /// 执行销毁回调（如果有）
    pub(crate) fn destroy(&self, instance: &ErasedInstance) -> Result<(), ContainerError> {
        match &self.definition.destroy {
            Some(callback) => callback(instance).map_err(|source| ContainerError::DestroyCallback {
                name: self.name().to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}

/// 解析计划：选中的定义及其依赖子树
pub(crate) struct ResolutionPlan {
    pub(crate) definition: Arc<RegisteredDefinition>,
    pub(crate) dependencies: Vec<(Dependency, ResolutionPlan)>,
    /// 规划时该单例已缓存，子树被省略
    pub(crate) pruned: bool,
}

#[derive(Default)]
pub(crate) struct Registry {
    definitions: Vec<Arc<RegisteredDefinition>>,
    keys: HashMap<DefinitionKey, usize>,
    by_type: HashMap<TypeId, Vec<usize>>,
}

impl Registry {
    pub(crate) fn insert(
        &mut self,
        definition: ServiceDefinition,
    ) -> Result<Arc<RegisteredDefinition>, ContainerError> {
        if self.keys.contains_key(definition.key()) {
            return Err(ContainerError::DuplicateDefinition {
                name: definition.name().to_string(),
                type_name: definition.type_name(),
            });
        }

        let id = self.definitions.len();
        let type_id = definition.key().type_id;
        self.keys.insert(definition.key().clone(), id);
        self.by_type.entry(type_id).or_default().push(id);

        let registered = Arc::new(RegisteredDefinition {
            id,
            definition,
            singleton: Mutex::new(None),
        });
        self.definitions.push(registered.clone());
        Ok(registered)
    }

    pub(crate) fn len(&self) -> usize {
        self.definitions.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<RegisteredDefinition>> {
        self.definitions.iter()
    }

    pub(crate) fn contains_type(&self, type_id: TypeId) -> bool {
        self.by_type.get(&type_id).map_or(false, |ids| !ids.is_empty())
    }

    /// 按注册顺序返回声明类型匹配的候选
    fn candidates(&self, type_id: TypeId) -> Vec<&Arc<RegisteredDefinition>> {
        self.by_type
            .get(&type_id)
            .map(|ids| ids.iter().map(|id| &self.definitions[*id]).collect())
            .unwrap_or_default()
    }

    /// 按类型（及可选限定符）选出唯一定义
    pub(crate) fn select(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        qualifier: Option<&str>,
    ) -> Result<&Arc<RegisteredDefinition>, ContainerError> {
        let candidates = self.candidates(type_id);

        match candidates.len() {
            0 => Err(ContainerError::NoSuchBean {
                type_name,
                qualifier: qualifier.map(str::to_string),
                available: Vec::new(),
            }),
            1 => Ok(candidates[0]),
            _ => match qualifier {
                Some(qualifier) => {
                    if let Some(by_name) = candidates
                        .iter()
                        .copied()
                        .find(|c| c.definition.matches_name(qualifier))
                    {
                        return Ok(by_name);
                    }

                    let tagged: Vec<_> = candidates
                        .iter()
                        .copied()
                        .filter(|c| c.definition.matches_qualifier(qualifier))
                        .collect();

                    match tagged.len() {
                        0 => Err(ContainerError::NoSuchBean {
                            type_name,
                            qualifier: Some(qualifier.to_string()),
                            available: names(&candidates),
                        }),
                        1 => Ok(tagged[0]),
                        _ => narrow_to_primary(type_name, &tagged),
                    }
                }
                None => narrow_to_primary(type_name, &candidates),
            },
        }
    }

    /// 按名称 + 类型精确查找
    pub(crate) fn select_named(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        name: &str,
    ) -> Result<&Arc<RegisteredDefinition>, ContainerError> {
        let candidates = self.candidates(type_id);
        candidates
            .iter()
            .copied()
            .find(|c| c.definition.matches_name(name))
            .ok_or_else(|| ContainerError::NoSuchBean {
                type_name,
                qualifier: Some(name.to_string()),
                available: names(&candidates),
            })
    }

    /// 深度优先构建解析计划，路径上的定义视为“解析中”，再次遇到即为循环依赖
    pub(crate) fn plan(
        &self,
        root: &Arc<RegisteredDefinition>,
    ) -> Result<ResolutionPlan, ContainerError> {
        let mut resolving = Vec::new();
        self.plan_node(root, &mut resolving)
    }

    fn plan_node(
        &self,
        node: &Arc<RegisteredDefinition>,
        resolving: &mut Vec<usize>,
    ) -> Result<ResolutionPlan, ContainerError> {
        if let Some(pos) = resolving.iter().position(|id| *id == node.id) {
            let mut chain: Vec<String> = resolving[pos..]
                .iter()
                .map(|id| self.definitions[*id].name().to_string())
                .collect();
            chain.push(node.name().to_string());
            return Err(ContainerError::CyclicDependency { chain });
        }

        if node.lifetime() == ServiceLifetime::Singleton && node.is_cached() {
            return Ok(ResolutionPlan {
                definition: node.clone(),
                dependencies: Vec::new(),
                pruned: true,
            });
        }

        resolving.push(node.id);
        let mut dependencies = Vec::with_capacity(node.definition.dependencies().len());
        for dependency in node.definition.dependencies() {
            let selected = self.select(
                dependency.type_id,
                dependency.type_name,
                dependency.qualifier.as_deref(),
            )?;
            let child = self.plan_node(selected, resolving)?;
            dependencies.push((dependency.clone(), child));
        }
        resolving.pop();

        Ok(ResolutionPlan {
            definition: node.clone(),
            dependencies,
            pruned: false,
        })
    }
}

fn names(candidates: &[&Arc<RegisteredDefinition>]) -> Vec<String> {
    candidates.iter().map(|c| c.name().to_string()).collect()
}

fn narrow_to_primary<'a>(
    type_name: &'static str,
    candidates: &[&'a Arc<RegisteredDefinition>],
) -> Result<&'a Arc<RegisteredDefinition>, ContainerError> {
    let primaries: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|c| c.definition.is_primary())
        .collect();

    if primaries.len() == 1 {
        Ok(primaries[0])
    } else {
        Err(ContainerError::AmbiguousBean {
            type_name,
            candidates: names(candidates),
            primaries: primaries.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::type_name;

    fn definition(name: &str) -> ServiceDefinition {
        ServiceDefinition::builder::<String>(name).build(|_| Ok(Arc::new(String::new())))
    }

    fn select_string<'a>(
        registry: &'a Registry,
        qualifier: Option<&str>,
    ) -> Result<&'a Arc<RegisteredDefinition>, ContainerError> {
        registry.select(TypeId::of::<String>(), type_name::<String>(), qualifier)
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let mut registry = Registry::default();
        registry.insert(definition("a")).unwrap();

        let result = registry.insert(definition("a"));
        assert!(matches!(
            result,
            Err(ContainerError::DuplicateDefinition { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_name_different_type_allowed() {
        let mut registry = Registry::default();
        registry.insert(definition("a")).unwrap();
        registry
            .insert(ServiceDefinition::builder::<u32>("a").build(|_| Ok(Arc::new(1u32))))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains_type(TypeId::of::<u32>()));
    }

    #[test]
    fn test_name_match_wins_over_qualifier() {
        let mut registry = Registry::default();
        registry
            .insert(
                ServiceDefinition::builder::<String>("first")
                    .qualifier("second")
                    .build(|_| Ok(Arc::new(String::new()))),
            )
            .unwrap();
        registry.insert(definition("second")).unwrap();

        let selected = select_string(&registry, Some("second")).unwrap();
        assert_eq!(selected.name(), "second");
    }

    #[test]
    fn test_qualifier_without_match() {
        let mut registry = Registry::default();
        registry.insert(definition("a")).unwrap();
        registry.insert(definition("b")).unwrap();

        match select_string(&registry, Some("missing")) {
            Err(ContainerError::NoSuchBean { available, .. }) => {
                assert_eq!(available, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected NoSuchBean, got {:?}", other.map(|d| d.name().to_string())),
        }
    }

    #[test]
    fn test_primary_and_ambiguity() {
        let mut registry = Registry::default();
        registry.insert(definition("a")).unwrap();
        registry.insert(definition("b")).unwrap();

        assert!(matches!(
            select_string(&registry, None),
            Err(ContainerError::AmbiguousBean { primaries: 0, .. })
        ));

        registry
            .insert(
                ServiceDefinition::builder::<String>("c")
                    .primary()
                    .build(|_| Ok(Arc::new(String::new()))),
            )
            .unwrap();
        assert_eq!(select_string(&registry, None).unwrap().name(), "c");
    }

    #[test]
    fn test_plan_detects_cycle() {
        let mut registry = Registry::default();
        let a = registry
            .insert(
                ServiceDefinition::builder::<String>("a")
                    .depends_on(Dependency::on::<u32>())
                    .build(|_| Ok(Arc::new(String::new()))),
            )
            .unwrap();
        registry
            .insert(
                ServiceDefinition::builder::<u32>("b")
                    .depends_on(Dependency::on::<String>())
                    .build(|_| Ok(Arc::new(0u32))),
            )
            .unwrap();

        match registry.plan(&a) {
            Err(ContainerError::CyclicDependency { chain }) => {
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            _ => panic!("expected CyclicDependency"),
        }
    }
}
